// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Conflict-guarded batch update protocol.
//!
//! A round takes up to `W` operations, lays their referenced store indices out
//! as `n * REFS` interleaved lanes and runs exact conflict detection over them.
//! The round is cut at the operation owning the first conflicting lane, the
//! remaining lanes are made inert, and the surviving operations run as one
//! masked gather, a lane-parallel update and one masked scatter. Because the
//! surviving operations touch pairwise distinct records, the result equals
//! applying them one at a time in arrival order.

use std::ops::AddAssign;

use crate::conflict::first_conflict;
use crate::gather::{gather, scatter, MaskedIndices};
use crate::lanes::{LaneMask, MAX_LANES, WIDTH};

/// A read-modify-write operation over `REFS` records of a slice-backed store.
pub trait GuardedUpdate<R, const REFS: usize> {
    /// Store indices this operation reads and writes, in lane order.
    fn refs(&self) -> [usize; REFS];

    /// Updates the gathered records in place. `records[i]` is the record at
    /// `self.refs()[i]`. Only called when those indices are pairwise distinct.
    fn update(&self, records: &mut [R; REFS]);

    /// Applies the operation directly to `store` with sequential semantics.
    fn apply_scalar(&self, store: &mut [R]);
}

/// Counters reported by [`apply_guarded`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardStats {
    /// Rounds executed.
    pub rounds: usize,
    /// Operations applied through gather/update/scatter.
    pub parallel_ops: usize,
    /// Operations applied through [`GuardedUpdate::apply_scalar`].
    pub scalar_ops: usize,
    /// Parallel rounds cut short by a detected conflict.
    pub truncated_rounds: usize,
}

impl AddAssign for GuardStats {
    fn add_assign(&mut self, rhs: Self) {
        self.rounds += rhs.rounds;
        self.parallel_ops += rhs.parallel_ops;
        self.scalar_ops += rhs.scalar_ops;
        self.truncated_rounds += rhs.truncated_rounds;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Round {
    Parallel { ops: usize, truncated: bool },
    Scalar,
}

fn run_round<const W: usize, R, U, const REFS: usize>(store: &mut [R], ops: &[U]) -> Option<Round>
where
    R: Copy + Default,
    U: GuardedUpdate<R, REFS>,
{
    const {
        assert!(
            REFS >= 1 && W >= 1 && W * REFS <= MAX_LANES,
            "round wider than a lane mask"
        )
    };
    let n = ops.len().min(W);
    if n == 0 {
        return None;
    }

    let mut lanes = [0usize; MAX_LANES];
    for (i, op) in ops[..n].iter().enumerate() {
        lanes[i * REFS..(i + 1) * REFS].copy_from_slice(&op.refs());
    }
    let lanes = &lanes[..n * REFS];

    let safe = first_conflict(lanes).map_or(n, |lane| (lane / REFS).min(n));
    if safe == 0 {
        // the first op references one record twice
        ops[0].apply_scalar(store);
        return Some(Round::Scalar);
    }

    let mut ix = MaskedIndices::<MAX_LANES>::invalid();
    for (lane, &i) in lanes.iter().enumerate() {
        ix.set(lane, i);
    }
    ix.truncate(safe * REFS);
    let live = ix.fixup(store.len());
    debug_assert_eq!(
        live,
        LaneMask::first_n(safe * REFS),
        "store index out of range"
    );

    let mut records: [R; MAX_LANES] = gather(store, &ix);
    for (i, op) in ops[..safe].iter().enumerate() {
        let slot = &mut records[i * REFS..(i + 1) * REFS];
        let mut rec: [R; REFS] = std::array::from_fn(|r| slot[r]);
        op.update(&mut rec);
        slot.copy_from_slice(&rec);
    }
    scatter(store, &ix, &records);

    Some(Round::Parallel {
        ops: safe,
        truncated: safe < n,
    })
}

/// Runs one guarded round over the front of `ops` and returns how many
/// operations it consumed (at least 1 unless `ops` is empty).
pub fn guarded_round<const W: usize, R, U, const REFS: usize>(store: &mut [R], ops: &[U]) -> usize
where
    R: Copy + Default,
    U: GuardedUpdate<R, REFS>,
{
    match run_round::<W, R, U, REFS>(store, ops) {
        None => 0,
        Some(Round::Scalar) => 1,
        Some(Round::Parallel { ops, .. }) => ops,
    }
}

/// Applies every operation through guarded rounds of [`WIDTH`] operations.
pub fn apply_guarded<R, U, const REFS: usize>(store: &mut [R], ops: &[U]) -> GuardStats
where
    R: Copy + Default,
    U: GuardedUpdate<R, REFS>,
{
    apply_guarded_lanes::<WIDTH, R, U, REFS>(store, ops)
}

/// [`apply_guarded`] with `W` operations per round.
pub fn apply_guarded_lanes<const W: usize, R, U, const REFS: usize>(
    store: &mut [R],
    ops: &[U],
) -> GuardStats
where
    R: Copy + Default,
    U: GuardedUpdate<R, REFS>,
{
    let mut stats = GuardStats::default();
    let mut pos = 0;
    while let Some(round) = run_round::<W, R, U, REFS>(store, &ops[pos..]) {
        stats.rounds += 1;
        match round {
            Round::Scalar => {
                stats.scalar_ops += 1;
                pos += 1;
            }
            Round::Parallel { ops, truncated } => {
                stats.parallel_ops += ops;
                stats.truncated_rounds += usize::from(truncated);
                pos += ops;
            }
        }
    }
    stats
}

/// Reference: applies every operation with [`GuardedUpdate::apply_scalar`] in order.
pub fn apply_sequential<R, U, const REFS: usize>(store: &mut [R], ops: &[U])
where
    U: GuardedUpdate<R, REFS>,
{
    for op in ops {
        op.apply_scalar(store);
    }
}
