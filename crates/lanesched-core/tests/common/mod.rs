// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use lanesched_core::{schedule_batch_lanes, schedule_batch_reference};

/// Seeds shared by the randomized tests.
pub const SEEDS: [u64; 5] = [
    0x1,
    0x1234_5678_9ABC_DEF0,
    0xDEAD_BEEF_CAFE_BABE,
    0xFEED_FACE_0123_4567,
    0x0F0F_0F0F_F0F0_F0F0,
];

/// Tiny deterministic RNG (xorshift64*) so queue builders don't need `rand`.
#[derive(Clone)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Creates a new PRNG; a zero seed is replaced with 1.
    pub fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    /// Next value of the xorshift64* sequence.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Value in `[0, upper)` (modulo bias is fine for tests).
    pub fn gen_range_usize(&mut self, upper: usize) -> usize {
        if upper <= 1 {
            return 0;
        }
        (self.next_u64() as usize) % upper
    }
}

/// Fisher–Yates shuffle (deterministic).
pub fn shuffle<T>(rng: &mut XorShift64, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range_usize(i + 1);
        items.swap(i, j);
    }
}

/// `n` keys drawn from `0..distinct`; tokens are original positions.
pub fn random_queue(rng: &mut XorShift64, n: usize, distinct: usize) -> (Vec<u32>, Vec<u32>) {
    let keys = (0..n)
        .map(|_| rng.gen_range_usize(distinct) as u32)
        .collect();
    let tokens = (0..n as u32).collect();
    (keys, tokens)
}

/// Keys from a byte string, tokens are positions.
pub fn lettered_queue(letters: &[u8]) -> (Vec<u8>, Vec<u32>) {
    (letters.to_vec(), (0..letters.len() as u32).collect())
}

/// Batches produced by draining a queue with the raw scheduler.
pub struct Drained<K> {
    /// Tokens per batch, in emission order.
    pub batches: Vec<Vec<u32>>,
    /// Keys per batch, parallel to `batches`.
    pub keys: Vec<Vec<K>>,
    /// Scheduler return values, one per call.
    pub sizes: Vec<usize>,
}

/// Runs the caller protocol with width `W` until the queue is consumed.
pub fn drain_with<const W: usize, K: Copy + Eq>(
    mut keys: Vec<K>,
    mut tokens: Vec<u32>,
) -> Drained<K> {
    let n = keys.len();
    let mut out = Drained {
        batches: Vec::new(),
        keys: Vec::new(),
        sizes: Vec::new(),
    };
    let mut pos = 0;
    while pos < n {
        let got = schedule_batch_lanes::<W, K, u32>(&mut keys[pos..], &mut tokens[pos..], n - pos);
        out.sizes.push(got);
        out.batches.push(tokens[pos..pos + got].to_vec());
        out.keys.push(keys[pos..pos + got].to_vec());
        pos += got;
    }
    out
}

/// Same as [`drain_with`] but through the `Vec`-based reference scheduler.
pub fn drain_reference<K: Copy + Eq>(
    mut keys: Vec<K>,
    mut tokens: Vec<u32>,
    width: usize,
) -> Drained<K> {
    let n = keys.len();
    let mut out = Drained {
        batches: Vec::new(),
        keys: Vec::new(),
        sizes: Vec::new(),
    };
    let mut pos = 0;
    while pos < n {
        let got = schedule_batch_reference(&mut keys[pos..], &mut tokens[pos..], n - pos, width);
        out.sizes.push(got);
        out.batches.push(tokens[pos..pos + got].to_vec());
        out.keys.push(keys[pos..pos + got].to_vec());
        pos += got;
    }
    out
}

/// Checks completeness, intra-batch uniqueness, same-key order and batch
/// bounds. `original_keys[token]` is the key of the item with that token.
pub fn check_schedule<K: Copy + Eq + Hash + Debug>(
    original_keys: &[K],
    drained: &Drained<K>,
    width: usize,
) -> Result<(), String> {
    let n = original_keys.len();
    let mut seen = vec![false; n];
    let mut batch_of = vec![0usize; n];
    for (b, (tokens, keys)) in drained.batches.iter().zip(&drained.keys).enumerate() {
        if tokens.is_empty() || tokens.len() > width {
            let size = tokens.len();
            return Err(format!("batch {b} has size {size} (width {width})"));
        }
        for (i, k) in keys.iter().enumerate() {
            if keys[..i].contains(k) {
                return Err(format!("batch {b} repeats key {k:?}"));
            }
        }
        for (&t, &k) in tokens.iter().zip(keys) {
            let t = t as usize;
            if t >= n || seen[t] {
                return Err(format!("token {t} lost or duplicated"));
            }
            if original_keys[t] != k {
                return Err(format!("token {t} travelled without its key"));
            }
            seen[t] = true;
            batch_of[t] = b;
        }
    }
    if let Some(t) = seen.iter().position(|s| !s) {
        return Err(format!("token {t} never scheduled"));
    }
    let mut last: HashMap<K, usize> = HashMap::new();
    for (t, k) in original_keys.iter().enumerate() {
        if let Some(&prev) = last.get(k) {
            if batch_of[prev] >= batch_of[t] {
                return Err(format!(
                    "same-key items {prev} and {t} landed in batches {} and {}",
                    batch_of[prev], batch_of[t]
                ));
            }
        }
        last.insert(*k, t);
    }
    Ok(())
}
