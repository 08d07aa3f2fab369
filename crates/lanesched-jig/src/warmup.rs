// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Vector-unit warm-up.
//!
//! Wide vector units may run at reduced throughput until they have been busy
//! for a while, so measurements start only after a short burst of lane-wise
//! rotates over a small working set.

use std::hint::black_box;

use lanesched_core::randomize_data;

const LANES: usize = 16;
const VECTORS: usize = 64;

/// Runs `rounds` lane-wise variable rotates and returns a checksum of the
/// working set so the loop cannot be elided.
pub fn warm_up_lanes(rounds: u32) -> u32 {
    let mut blob = [[0u32; LANES]; VECTORS];
    randomize_data(bytemuck::cast_slice_mut(&mut blob[..]));

    let mut tmp = blob[VECTORS - 1];
    for i in 0..rounds as usize {
        let idx = i & (VECTORS - 1);
        let src = blob[idx];
        tmp = std::array::from_fn(|l| src[l].rotate_right(tmp[l] & 0x1F));
        blob[idx] = tmp;
    }

    black_box(&blob).iter().flatten().fold(0, |acc, &x| acc ^ x)
}
