// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Telemetry seam for the drain loop and the guarded update protocol.
//!
//! All hooks default to no-ops; sinks override what they care about.

use tracing::{debug, trace};

use crate::guard::GuardStats;
use crate::queue::{BatchKind, DrainStats};

/// Receiver for drain and update-protocol events.
pub trait TelemetrySink: Send + Sync {
    /// A batch of `size` items was handed to the caller.
    fn on_batch(&self, _kind: BatchKind, _size: usize) {}

    /// The flush policy forced `size` items out after `deferrals` consecutive
    /// short batches.
    fn on_flush(&self, _deferrals: usize, _size: usize) {}

    /// A drain ran to completion.
    fn on_summary(&self, _stats: &DrainStats) {}

    /// A guarded application finished.
    fn on_guarded(&self, _stats: &GuardStats) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {}

/// Forwards events to `tracing` (batches at `trace`, everything else at `debug`).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn on_batch(&self, kind: BatchKind, size: usize) {
        trace!(?kind, size, "batch");
    }

    fn on_flush(&self, deferrals: usize, size: usize) {
        debug!(deferrals, size, "forced flush");
    }

    fn on_summary(&self, stats: &DrainStats) {
        debug!(
            calls = stats.calls,
            parallel_batches = stats.parallel_batches,
            sequential_batches = stats.sequential_batches,
            parallel_items = stats.parallel_items,
            sequential_items = stats.sequential_items,
            flushes = stats.flushes,
            "drain complete"
        );
    }

    fn on_guarded(&self, stats: &GuardStats) {
        debug!(
            rounds = stats.rounds,
            parallel_ops = stats.parallel_ops,
            scalar_ops = stats.scalar_ops,
            truncated_rounds = stats.truncated_rounds,
            "guarded apply complete"
        );
    }
}
