// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Masked indices and masked gather/scatter over a slice-backed store.
//!
//! A lane is either a valid store index or inert. Inert lanes are tracked in
//! an explicit validity mask rather than encoded into the index value, so a
//! gather or scatter can never read or write through an inert lane.

use crate::lanes::{LaneMask, MAX_LANES};

/// `N` store indices plus the mask of lanes that currently hold a valid one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskedIndices<const N: usize> {
    indices: [usize; N],
    valid: LaneMask,
}

impl<const N: usize> Default for MaskedIndices<N> {
    fn default() -> Self {
        Self::invalid()
    }
}

impl<const N: usize> MaskedIndices<N> {
    /// All lanes inert.
    pub const fn invalid() -> Self {
        const { assert!(N <= MAX_LANES, "vector wider than a lane mask") };
        Self {
            indices: [0; N],
            valid: LaneMask::EMPTY,
        }
    }

    /// Lanes holding `Some(ix)` are valid, `None` lanes are inert.
    pub fn from_options(lanes: [Option<usize>; N]) -> Self {
        let mut out = Self::invalid();
        for (lane, ix) in lanes.into_iter().enumerate() {
            if let Some(ix) = ix {
                out.set(lane, ix);
            }
        }
        out
    }

    /// Makes `lane` valid with store index `ix`.
    #[inline]
    pub fn set(&mut self, lane: usize, ix: usize) {
        debug_assert!(lane < N, "lane {lane} out of range for {N} lanes");
        if let Some(slot) = self.indices.get_mut(lane) {
            *slot = ix;
            self.valid = self.valid.with(lane);
        }
    }

    /// Store index of `lane`, or `None` if the lane is inert.
    #[inline]
    pub fn get(&self, lane: usize) -> Option<usize> {
        if self.valid.contains(lane) {
            self.indices.get(lane).copied()
        } else {
            None
        }
    }

    /// Makes `lane` inert.
    #[inline]
    pub fn invalidate(&mut self, lane: usize) {
        self.valid = self.valid.without(lane);
    }

    /// Makes every lane `>= n` inert.
    #[inline]
    pub fn truncate(&mut self, n: usize) {
        self.valid = self.valid & LaneMask::first_n(n);
    }

    /// Mask of valid lanes.
    #[inline]
    pub const fn valid(&self) -> LaneMask {
        self.valid
    }

    /// Invalidates lanes whose index does not address a store of `len`
    /// records and returns the lanes that remain valid.
    pub fn fixup(&mut self, len: usize) -> LaneMask {
        for lane in self.valid {
            if self.indices[lane] >= len {
                self.valid = self.valid.without(lane);
            }
        }
        self.valid
    }
}

/// Masked gather: lane `i` reads `store[ix_i]` when valid and in range, else
/// yields `R::default()`.
pub fn gather<R: Copy + Default, const N: usize>(store: &[R], ix: &MaskedIndices<N>) -> [R; N] {
    std::array::from_fn(|lane| {
        ix.get(lane)
            .and_then(|i| store.get(i).copied())
            .unwrap_or_default()
    })
}

/// Masked scatter: writes `values[i]` to `store[ix_i]` for every valid,
/// in-range lane in ascending lane order. On a duplicate index the later lane
/// wins.
pub fn scatter<R: Copy, const N: usize>(store: &mut [R], ix: &MaskedIndices<N>, values: &[R; N]) {
    for lane in ix.valid() {
        if let Some(slot) = ix.get(lane).and_then(|i| store.get_mut(i)) {
            *slot = values[lane];
        }
    }
}
