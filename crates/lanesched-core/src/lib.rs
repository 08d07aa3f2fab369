// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! lanesched-core: conflict-aware batch scheduling for lane-parallel updates.
//!
//! Two layers cooperate:
//! - [`schedule_batch`] turns a queue of `(key, token)` items into batches of
//!   up to [`WIDTH`] items with pairwise distinct keys, preserving per-key order.
//! - [`apply_guarded`] applies read-modify-write operations to a shared store
//!   in rounds whose operations touch pairwise distinct records, using exact
//!   conflict detection over the referenced indices plus masked gather/scatter.
//!
//! The lane primitives are portable fixed-width array code; no intrinsics.
#![forbid(unsafe_code)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::module_name_repetitions
)]

mod conflict;
mod gather;
mod guard;
mod lanes;
mod ledger;
mod queue;
mod random;
mod schedule;
mod telemetry;

/// Exact duplicate detection within a lane vector.
pub use conflict::{conflict_detect, conflict_mask, first_conflict};
/// Masked indices and masked gather/scatter.
pub use gather::{gather, scatter, MaskedIndices};
/// Conflict-guarded update protocol.
pub use guard::{
    apply_guarded, apply_guarded_lanes, apply_sequential, guarded_round, GuardStats, GuardedUpdate,
};
/// Lane masks and mask/vector conversion.
pub use lanes::{
    blend, compress_partition, lane_index, mask_to_vec, vec_to_mask, LaneBits, LaneIter, LaneMask,
    LOOKAHEAD, MAX_LANES, WIDTH,
};
/// Accounts table.
pub use ledger::{
    account_key, random_transfers, Account, AccountTable, LedgerError, ScheduledOutcome, Transfer,
};
/// Owned work queue and drain loop.
pub use queue::{BatchKind, BatchView, DrainStats, FlushPolicy, QueueError, WorkQueue};
/// Random buffers and key streams.
pub use random::{random_keys, randomize_data, randomize_seeded};
/// Batch scheduler.
pub use schedule::{schedule_batch, schedule_batch_lanes, schedule_batch_reference, MAX_WINDOW};
/// Telemetry seam.
pub use telemetry::{NullTelemetrySink, TelemetrySink, TracingTelemetrySink};
