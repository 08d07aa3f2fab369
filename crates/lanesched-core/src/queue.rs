// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Owned work queue and the scheduling drain loop.
//!
//! [`WorkQueue::drain`] runs the scheduler's caller protocol to exhaustion:
//! schedule a batch at the front, hand it to the caller, advance, repeat.
//! A [`FlushPolicy`] bounds the latency of pathological inputs (long runs of
//! one key) by emitting a sequential batch after too many short ones.

use thiserror::Error;
use tracing::instrument;

use crate::lanes::WIDTH;
use crate::schedule::schedule_batch_lanes;
use crate::telemetry::TelemetrySink;

/// Errors raised while building a [`WorkQueue`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Keys and tokens must describe the same items.
    #[error("queue length mismatch: {keys} keys vs {tokens} tokens")]
    LengthMismatch {
        /// Number of keys supplied.
        keys: usize,
        /// Number of tokens supplied.
        tokens: usize,
    },
}

/// Forced-flush policy applied by [`WorkQueue::drain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushPolicy {
    /// Consecutive deferrals tolerated before a forced flush.
    pub max_deferrals: usize,
    /// A parallel batch smaller than this (while items remain) is a deferral.
    pub min_batch: usize,
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self {
            max_deferrals: 4,
            min_batch: 2,
        }
    }
}

impl FlushPolicy {
    /// Never force a flush.
    pub const fn never() -> Self {
        Self {
            max_deferrals: usize::MAX,
            min_batch: 0,
        }
    }
}

/// How a batch was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchKind {
    /// Scheduled batch: keys are pairwise distinct.
    Parallel,
    /// Forced flush: items in queue order, keys may repeat.
    Sequential,
}

/// One batch handed to the drain callback.
#[derive(Debug, Clone, Copy)]
pub struct BatchView<'a, K, T> {
    /// Batch kind.
    pub kind: BatchKind,
    /// Keys of the batch items.
    pub keys: &'a [K],
    /// Tokens of the batch items, parallel to `keys`.
    pub tokens: &'a [T],
}

/// Counters reported by [`WorkQueue::drain`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Scheduler invocations.
    pub calls: usize,
    /// Batches of kind [`BatchKind::Parallel`].
    pub parallel_batches: usize,
    /// Batches of kind [`BatchKind::Sequential`].
    pub sequential_batches: usize,
    /// Items delivered in parallel batches.
    pub parallel_items: usize,
    /// Items delivered in sequential batches.
    pub sequential_items: usize,
    /// Forced flushes.
    pub flushes: usize,
}

impl DrainStats {
    /// Items delivered in total.
    pub const fn items(&self) -> usize {
        self.parallel_items + self.sequential_items
    }
}

/// Queue of `(key, token)` work items stored as two parallel vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkQueue<K, T> {
    keys: Vec<K>,
    tokens: Vec<T>,
}

impl<K, T> Default for WorkQueue<K, T> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            tokens: Vec::new(),
        }
    }
}

impl<K: Copy + Eq, T: Copy> WorkQueue<K, T> {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty queue with room for `cap` items.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            keys: Vec::with_capacity(cap),
            tokens: Vec::with_capacity(cap),
        }
    }

    /// Builds a queue from parallel vectors.
    ///
    /// # Errors
    /// Returns [`QueueError::LengthMismatch`] if the vectors differ in length.
    pub fn from_parts(keys: Vec<K>, tokens: Vec<T>) -> Result<Self, QueueError> {
        if keys.len() != tokens.len() {
            return Err(QueueError::LengthMismatch {
                keys: keys.len(),
                tokens: tokens.len(),
            });
        }
        Ok(Self { keys, tokens })
    }

    /// Appends one item.
    pub fn push(&mut self, key: K, token: T) {
        self.keys.push(key);
        self.tokens.push(token);
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Queued keys.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Queued tokens, parallel to [`Self::keys`].
    pub fn tokens(&self) -> &[T] {
        &self.tokens
    }

    /// Drains the queue in batches of up to [`WIDTH`] items.
    pub fn drain<F>(&mut self, policy: FlushPolicy, sink: &dyn TelemetrySink, f: F) -> DrainStats
    where
        F: FnMut(BatchView<'_, K, T>),
    {
        self.drain_lanes::<WIDTH, F>(policy, sink, f)
    }

    /// [`Self::drain`] with batch width `W`; forced flushes emit up to `2 * W` items.
    #[instrument(level = "debug", skip_all, fields(items = self.keys.len(), width = W))]
    pub fn drain_lanes<const W: usize, F>(
        &mut self,
        policy: FlushPolicy,
        sink: &dyn TelemetrySink,
        mut f: F,
    ) -> DrainStats
    where
        F: FnMut(BatchView<'_, K, T>),
    {
        let n = self.keys.len();
        let mut stats = DrainStats::default();
        let mut pos = 0;
        let mut streak = 0usize;

        while pos < n {
            let remaining = n - pos;
            if streak > policy.max_deferrals {
                let size = remaining.min(2 * W);
                sink.on_flush(streak, size);
                f(BatchView {
                    kind: BatchKind::Sequential,
                    keys: &self.keys[pos..pos + size],
                    tokens: &self.tokens[pos..pos + size],
                });
                sink.on_batch(BatchKind::Sequential, size);
                stats.flushes += 1;
                stats.sequential_batches += 1;
                stats.sequential_items += size;
                pos += size;
                streak = 0;
                continue;
            }

            let size = schedule_batch_lanes::<W, K, T>(
                &mut self.keys[pos..],
                &mut self.tokens[pos..],
                remaining,
            );
            stats.calls += 1;
            f(BatchView {
                kind: BatchKind::Parallel,
                keys: &self.keys[pos..pos + size],
                tokens: &self.tokens[pos..pos + size],
            });
            sink.on_batch(BatchKind::Parallel, size);
            stats.parallel_batches += 1;
            stats.parallel_items += size;
            pos += size;

            if size < policy.min_batch && pos < n {
                streak += 1;
            } else {
                streak = 0;
            }
        }

        self.keys.clear();
        self.tokens.clear();
        sink.on_summary(&stats);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::NullTelemetrySink;

    #[test]
    fn from_parts_rejects_mismatched_lengths() {
        let err = WorkQueue::<u32, u32>::from_parts(vec![1, 2], vec![0]);
        assert_eq!(err, Err(QueueError::LengthMismatch { keys: 2, tokens: 1 }));
    }

    #[test]
    fn drain_empty_queue_reports_nothing() {
        let mut q = WorkQueue::<u32, u32>::new();
        let stats = q.drain(FlushPolicy::default(), &NullTelemetrySink, |_| {});
        assert_eq!(stats, DrainStats::default());
    }

    #[test]
    fn identical_keys_without_flush_take_one_call_per_item() {
        let mut q = WorkQueue::with_capacity(100);
        for i in 0..100u32 {
            q.push(b'Z', i);
        }
        let mut sizes = Vec::new();
        let stats = q.drain(FlushPolicy::never(), &NullTelemetrySink, |b| {
            sizes.push(b.keys.len());
        });
        assert_eq!(stats.calls, 100);
        assert!(sizes.iter().all(|&s| s == 1));
        assert!(q.is_empty());
    }

    #[test]
    fn identical_keys_with_default_policy_are_flushed() {
        let mut q = WorkQueue::new();
        for i in 0..100u32 {
            q.push(7u32, i);
        }
        let mut order = Vec::new();
        let stats = q.drain(FlushPolicy::default(), &NullTelemetrySink, |b| {
            order.extend_from_slice(b.tokens);
        });
        // 5 single-item calls then a 16-item flush, four times, then 5 calls and an 11-item flush
        assert_eq!(stats.calls, 25);
        assert_eq!(stats.flushes, 5);
        assert_eq!(stats.sequential_items, 75);
        assert_eq!(stats.items(), 100);
        assert_eq!(order, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn distinct_keys_fill_full_batches() {
        let mut q =
            WorkQueue::from_parts((0..20u32).collect(), (0..20u32).collect()).unwrap_or_default();
        let mut sizes = Vec::new();
        let stats = q.drain(FlushPolicy::default(), &NullTelemetrySink, |b| {
            assert_eq!(b.kind, BatchKind::Parallel);
            sizes.push(b.keys.len());
        });
        assert_eq!(sizes, vec![8, 8, 4]);
        assert_eq!(stats.flushes, 0);
    }
}
