// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Exact duplicate detection within a lane vector.
//!
//! Portable O(N²) pairwise comparison. Lane widths of interest are small
//! (8 to 32), so the quadratic form stays well inside one cache line of work.

use crate::lanes::{LaneMask, MAX_LANES};

/// Zeroing conflict detection.
///
/// For every lane in `active`, returns the set of *earlier* active lanes
/// holding an equal value. A lane's entry is [`LaneMask::EMPTY`] iff its value
/// is unique among the active lanes up to and including itself. Inactive lanes
/// always yield `EMPTY` and never contribute to other lanes' results.
pub fn conflict_detect<T: Eq, const N: usize>(values: &[T; N], active: LaneMask) -> [LaneMask; N] {
    const { assert!(N <= MAX_LANES, "vector wider than a lane mask") };
    let mut out = [LaneMask::EMPTY; N];
    for lane in active.iter().filter(|&l| l < N) {
        let earlier = active & LaneMask::first_n(lane);
        out[lane] = earlier
            .iter()
            .filter(|&j| values[j] == values[lane])
            .fold(LaneMask::EMPTY, LaneMask::with);
    }
    out
}

/// Lanes of `values` that repeat the value of some earlier lane.
///
/// Lane 0 is never set. `values` holds at most [`MAX_LANES`] lanes.
pub fn conflict_mask<T: Eq>(values: &[T]) -> LaneMask {
    debug_assert!(values.len() <= MAX_LANES, "vector wider than a lane mask");
    let mut mask = LaneMask::EMPTY;
    for (i, v) in values.iter().enumerate().take(MAX_LANES).skip(1) {
        if values[..i].contains(v) {
            mask = mask.with(i);
        }
    }
    mask
}

/// Lowest lane of `values` that repeats an earlier lane's value.
#[inline]
pub fn first_conflict<T: Eq>(values: &[T]) -> Option<usize> {
    conflict_mask(values).first()
}
