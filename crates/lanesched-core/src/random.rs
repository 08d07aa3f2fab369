// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Random buffers and key streams for benchmarks and fuzzing.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Fills `buf` from the thread-local, OS-seeded generator.
pub fn randomize_data(buf: &mut [u8]) {
    rand::thread_rng().fill_bytes(buf);
}

/// Fills `buf` deterministically from `seed`.
pub fn randomize_seeded(buf: &mut [u8], seed: u64) {
    StdRng::seed_from_u64(seed).fill_bytes(buf);
}

/// `n` keys uniform over `0..modulo`. `modulo` must be non-zero.
pub fn random_keys(n: usize, modulo: u32, seed: u64) -> Vec<u32> {
    debug_assert!(modulo > 0, "modulo must be non-zero");
    let modulo = modulo.max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen::<u32>() % modulo).collect()
}
