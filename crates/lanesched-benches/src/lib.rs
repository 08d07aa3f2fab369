// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared input builders for the lanesched microbenchmarks.
//!
//! Inputs are seeded so runs compare like with like.
#![forbid(unsafe_code)]

use lanesched_core::random_keys;

/// Seed used by every benchmark input.
pub const BENCH_SEED: u64 = 0x4c41_4e45_5343_4844;

/// `n` keys over `0..modulo` plus positional tokens.
pub fn keyed_queue(n: usize, modulo: u32) -> (Vec<u32>, Vec<u32>) {
    let keys = random_keys(n, modulo, BENCH_SEED ^ n as u64);
    let tokens = (0..).take(n).collect();
    (keys, tokens)
}

/// Runs the scheduler caller protocol over the whole queue and returns the
/// number of batches.
pub fn drain_count(keys: &mut [u32], tokens: &mut [u32]) -> usize {
    let n = keys.len().min(tokens.len());
    let mut batches = 0;
    let mut i = 0;
    while i < n {
        i += lanesched_core::schedule_batch(&mut keys[i..], &mut tokens[i..], n - i);
        batches += 1;
    }
    batches
}
