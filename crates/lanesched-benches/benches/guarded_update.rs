// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Benchmark: account transfers, sequential vs guarded vs scheduled.
//!
//! Table construction and transfer generation happen in setup. Throughput
//! "elements" are transfers. Small account counts are the high-collision case.
use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use lanesched_benches::BENCH_SEED;
use lanesched_core::{random_transfers, AccountTable, FlushPolicy, NullTelemetrySink};

const TRANSFERS: usize = 20_000;

fn bench_accounts(c: &mut Criterion) {
    let mut group = c.benchmark_group("guarded_update");
    group.throughput(Throughput::Elements(TRANSFERS as u64));
    for &accounts in &[16usize, 4_096, 65_536] {
        let transfers = random_transfers(TRANSFERS, accounts, 1_000, BENCH_SEED);
        let base = AccountTable::new(accounts, 1_000_000);

        group.bench_with_input(BenchmarkId::new("sequential", accounts), &accounts, |b, _| {
            b.iter_batched(
                || base.clone(),
                |mut t| {
                    t.apply_sequential(&transfers);
                    black_box(t)
                },
                BatchSize::LargeInput,
            );
        });
        group.bench_with_input(BenchmarkId::new("guarded", accounts), &accounts, |b, _| {
            b.iter_batched(
                || base.clone(),
                |mut t| {
                    let stats = t.apply_guarded(&transfers);
                    black_box((t, stats))
                },
                BatchSize::LargeInput,
            );
        });
        group.bench_with_input(BenchmarkId::new("scheduled", accounts), &accounts, |b, _| {
            b.iter_batched(
                || base.clone(),
                |mut t| {
                    let outcome =
                        t.apply_scheduled(&transfers, FlushPolicy::default(), &NullTelemetrySink);
                    black_box((t, outcome))
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_accounts);
criterion_main!(benches);
