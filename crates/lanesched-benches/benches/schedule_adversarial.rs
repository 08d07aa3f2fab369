// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Benchmark: pathological key streams.
//!
//! Long runs of one key degrade the scheduler to one item per call; the drain
//! loop's flush policy bounds that. Compares both policies on the same input.
use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use lanesched_benches::drain_count;
use lanesched_core::{FlushPolicy, NullTelemetrySink, WorkQueue};

fn single_key_queue(n: usize) -> WorkQueue<u32, u32> {
    let mut q = WorkQueue::with_capacity(n);
    for i in 0..n {
        q.push(0xDEAD, u32::try_from(i).unwrap_or(u32::MAX));
    }
    q
}

fn bench_single_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_adversarial/single_key");
    for &n in &[1_000usize, 10_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("raw", n), &n, |b, &n| {
            b.iter_batched(
                || (vec![0xDEADu32; n], (0..).take(n).collect::<Vec<u32>>()),
                |(mut k, mut t)| black_box(drain_count(&mut k, &mut t)),
                BatchSize::LargeInput,
            );
        });
        for (label, policy) in [
            ("never_flush", FlushPolicy::never()),
            ("default_flush", FlushPolicy::default()),
        ] {
            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, &n| {
                b.iter_batched(
                    || single_key_queue(n),
                    |mut q| {
                        black_box(q.drain(policy, &NullTelemetrySink, |view| {
                            black_box(view.tokens);
                        }))
                    },
                    BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_alternating_pairs(c: &mut Criterion) {
    // A A B B C C ...: every window holds exactly half first occurrences
    let mut group = c.benchmark_group("schedule_adversarial/pairs");
    let n = 8_192usize;
    group.throughput(Throughput::Elements(n as u64));
    group.bench_function(BenchmarkId::from_parameter(n), |b| {
        b.iter_batched(
            || {
                let keys: Vec<u32> = (0..n)
                    .map(|i| u32::try_from(i / 2).unwrap_or(u32::MAX))
                    .collect();
                let tokens: Vec<u32> = (0..).take(n).collect();
                (keys, tokens)
            },
            |(mut k, mut t)| black_box(drain_count(&mut k, &mut t)),
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_single_key, bench_alternating_pairs);
criterion_main!(benches);
