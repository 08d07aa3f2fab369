// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Conflict-aware batch scheduler.
//!
//! Each call looks at a window of `min(extent, 2 * W)` queue items, stably
//! partitions it into first occurrences (no earlier item in the window has
//! the same key) followed by repeats, and returns how many items at the front
//! form one conflict-free batch of at most `W` items.
//!
//! Invariants:
//! - Keys and tokens are permuted in lockstep, only inside the window.
//! - Within a key, items never overtake each other: a repeat is only ever moved
//!   behind a first occurrence of a *different* key.
//! - The returned batch size is `>= 1` for a non-empty window and `<= W`.
//! - No state survives between calls; every call recomputes its window.

use crate::conflict::conflict_mask;
use crate::lanes::{compress_partition, LaneMask, LOOKAHEAD, WIDTH};

/// Widest lookahead window supported by [`schedule_batch_lanes`].
pub const MAX_WINDOW: usize = 2 * LOOKAHEAD;

/// Schedules one batch of up to [`WIDTH`] items from the front of the queue.
///
/// `keys` and `tokens` must both hold at least `extent` items and `extent`
/// must be non-zero; both are checked in debug builds only. Advance the queue
/// by the returned count and call again until `extent` is consumed.
#[inline]
pub fn schedule_batch<K: Copy + Eq, T: Copy>(
    keys: &mut [K],
    tokens: &mut [T],
    extent: usize,
) -> usize {
    schedule_batch_lanes::<WIDTH, K, T>(keys, tokens, extent)
}

/// [`schedule_batch`] for an arbitrary batch width `W` (lookahead `2 * W`).
///
/// `W = 1` is the scalar fallback: it never reorders and always returns 1.
pub fn schedule_batch_lanes<const W: usize, K: Copy + Eq, T: Copy>(
    keys: &mut [K],
    tokens: &mut [T],
    extent: usize,
) -> usize {
    const { assert!(W >= 1 && 2 * W <= MAX_WINDOW, "unsupported batch width") };
    debug_assert!(extent > 0, "schedule_batch called with an empty extent");
    debug_assert!(
        keys.len() >= extent && tokens.len() >= extent,
        "extent {extent} exceeds queue ({} keys, {} tokens)",
        keys.len(),
        tokens.len()
    );

    let window = extent.min(2 * W).min(keys.len()).min(tokens.len());
    if window == 0 {
        return 0;
    }
    let (keys, tokens) = (&mut keys[..window], &mut tokens[..window]);

    let repeats = conflict_mask(keys);
    let firsts = !repeats & LaneMask::first_n(window);
    let unique = compress_partition(keys, tokens, firsts);
    unique.min(W)
}

/// Straightforward `Vec`-based rendition of the scheduler used as a
/// differential oracle. `width` plays the role of `W`.
pub fn schedule_batch_reference<K: Copy + Eq, T: Copy>(
    keys: &mut [K],
    tokens: &mut [T],
    extent: usize,
    width: usize,
) -> usize {
    let window = extent.min(2 * width).min(keys.len()).min(tokens.len());
    let mut firsts = Vec::with_capacity(window);
    let mut repeats = Vec::with_capacity(window);
    for i in 0..window {
        let item = (keys[i], tokens[i]);
        if keys[..i].contains(&item.0) {
            repeats.push(item);
        } else {
            firsts.push(item);
        }
    }
    let unique = firsts.len();
    for (i, (k, t)) in firsts.into_iter().chain(repeats).enumerate() {
        keys[i] = k;
        tokens[i] = t;
    }
    unique.min(width)
}
