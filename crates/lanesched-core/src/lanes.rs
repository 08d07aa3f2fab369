// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lane masks and mask/vector conversion.
//!
//! A "vector" in this crate is a plain `[T; N]` array where every element is
//! one lane. The helpers here mirror the mask-register instructions of wide
//! vector units (broadcast a mask bit to a whole lane, collect lane MSBs into a
//! scalar mask, blend, compress) as portable array code.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// Lanes per parallel batch (one 512-bit register of 64-bit lanes).
pub const WIDTH: usize = 8;

/// Scheduler lookahead window: twice the batch width.
pub const LOOKAHEAD: usize = 2 * WIDTH;

/// Widest lane set a [`LaneMask`] can describe.
pub const MAX_LANES: usize = 64;

/// Scalar bitmask over up to [`MAX_LANES`] lanes; bit `i` describes lane `i`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LaneMask(u64);

impl LaneMask {
    /// No lanes set.
    pub const EMPTY: Self = Self(0);

    /// Wraps raw mask bits.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Lanes `0..n`. Saturates at [`MAX_LANES`].
    pub const fn first_n(n: usize) -> Self {
        if n >= MAX_LANES {
            Self(u64::MAX)
        } else {
            Self((1u64 << n) - 1)
        }
    }

    /// Raw mask bits.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns true if `lane` is set.
    #[inline]
    pub const fn contains(self, lane: usize) -> bool {
        lane < MAX_LANES && (self.0 >> lane) & 1 == 1
    }

    /// Returns a copy with `lane` set.
    #[inline]
    pub const fn with(self, lane: usize) -> Self {
        if lane < MAX_LANES {
            Self(self.0 | (1u64 << lane))
        } else {
            self
        }
    }

    /// Returns a copy with `lane` cleared.
    #[inline]
    pub const fn without(self, lane: usize) -> Self {
        if lane < MAX_LANES {
            Self(self.0 & !(1u64 << lane))
        } else {
            self
        }
    }

    /// Number of set lanes.
    #[inline]
    pub const fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns true if no lane is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Lowest set lane, if any.
    #[inline]
    pub const fn first(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }

    /// Iterates set lanes in ascending order.
    pub fn iter(self) -> LaneIter {
        LaneIter(self.0)
    }
}

impl fmt::Debug for LaneMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LaneMask({:#b})", self.0)
    }
}

impl BitAnd for LaneMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for LaneMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Not for LaneMask {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl IntoIterator for LaneMask {
    type Item = usize;
    type IntoIter = LaneIter;
    fn into_iter(self) -> LaneIter {
        self.iter()
    }
}

/// Ascending iterator over the set lanes of a [`LaneMask`].
#[derive(Clone, Debug)]
pub struct LaneIter(u64);

impl Iterator for LaneIter {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let lane = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(lane)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for LaneIter {}

/// Unsigned lane element types usable with [`mask_to_vec`] and [`vec_to_mask`].
pub trait LaneBits: Copy + PartialEq + fmt::Debug {
    /// All bits clear.
    const ZERO: Self;
    /// All bits set.
    const ALL_ONES: Self;

    /// Returns true if the most significant bit of the lane is set.
    fn msb_set(self) -> bool;

    /// Lane number as a lane value (lane numbers are always below [`MAX_LANES`]).
    fn from_lane(lane: usize) -> Self;
}

macro_rules! impl_lane_bits {
    ($($t:ty),* $(,)?) => {
        $(
            impl LaneBits for $t {
                const ZERO: Self = 0;
                const ALL_ONES: Self = <$t>::MAX;

                #[inline]
                fn msb_set(self) -> bool {
                    (self >> (<$t>::BITS - 1)) != 0
                }

                #[inline]
                #[allow(clippy::cast_possible_truncation)]
                fn from_lane(lane: usize) -> Self {
                    lane as $t
                }
            }
        )*
    };
}

impl_lane_bits!(u8, u16, u32, u64);

/// Expands `mask` into a vector whose lane `i` is all-ones iff bit `i` is set.
#[inline]
pub fn mask_to_vec<T: LaneBits, const N: usize>(mask: LaneMask) -> [T; N] {
    const { assert!(N <= MAX_LANES, "vector wider than a lane mask") };
    std::array::from_fn(|lane| {
        if mask.contains(lane) {
            T::ALL_ONES
        } else {
            T::ZERO
        }
    })
}

/// Collects the most significant bit of every lane into a mask.
#[inline]
pub fn vec_to_mask<T: LaneBits, const N: usize>(vec: &[T; N]) -> LaneMask {
    const { assert!(N <= MAX_LANES, "vector wider than a lane mask") };
    vec.iter()
        .enumerate()
        .filter(|(_, v)| v.msb_set())
        .fold(LaneMask::EMPTY, |m, (lane, _)| m.with(lane))
}

/// Vector whose lane `i` holds the value `i`.
#[inline]
pub fn lane_index<T: LaneBits, const N: usize>() -> [T; N] {
    const { assert!(N <= MAX_LANES, "vector wider than a lane mask") };
    std::array::from_fn(T::from_lane)
}

/// Per-lane select: lane `i` comes from `on_true` when bit `i` is set, else from `on_false`.
#[inline]
pub fn blend<T: Copy, const N: usize>(
    mask: LaneMask,
    on_true: &[T; N],
    on_false: &[T; N],
) -> [T; N] {
    std::array::from_fn(|lane| {
        if mask.contains(lane) {
            on_true[lane]
        } else {
            on_false[lane]
        }
    })
}

/// Stable two-way partition of two parallel slices by lane mask.
///
/// Lanes in `keep` move to the front, the remaining lanes follow; relative
/// order inside each group is preserved and `keys`/`tokens` are permuted in
/// lockstep. Returns the number of kept lanes.
///
/// Both slices must have the same length, at most [`MAX_LANES`].
pub fn compress_partition<K: Copy, T: Copy>(
    keys: &mut [K],
    tokens: &mut [T],
    keep: LaneMask,
) -> usize {
    let n = keys.len();
    debug_assert_eq!(n, tokens.len(), "keys and tokens must be the same length");
    debug_assert!(n <= MAX_LANES, "partition wider than a lane mask");
    if n == 0 {
        return 0;
    }
    let tokens = &mut tokens[..n];
    let all = LaneMask::first_n(n);
    let kept = keep & all;

    let mut key_buf = [keys[0]; MAX_LANES];
    let mut token_buf = [tokens[0]; MAX_LANES];
    for (out, lane) in kept.iter().chain((!kept & all).iter()).enumerate() {
        key_buf[out] = keys[lane];
        token_buf[out] = tokens[lane];
    }
    keys.copy_from_slice(&key_buf[..n]);
    tokens.copy_from_slice(&token_buf[..n]);
    kept.count()
}
