// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Jig measurements.

use std::hint::black_box;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use lanesched_core::{
    conflict_mask, random_keys, random_transfers, schedule_batch, AccountTable, FlushPolicy,
    TracingTelemetrySink, MAX_LANES,
};
use tracing::{debug, info, instrument};

use crate::config::{write_config, ConfigStore, JigConfig};
use crate::report::{ns_per, ratio, Report};

/// Inputs of [`run_schedule_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleParams {
    /// Queue length.
    pub qlen: u32,
    /// Keys are reduced modulo this value.
    pub modulo: u32,
    /// Key seed.
    pub seed: u64,
}

/// Inputs of [`run_accounts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountsParams {
    /// Number of accounts.
    pub accounts: usize,
    /// Number of transfers.
    pub transfers: usize,
    /// Transfer seed.
    pub seed: u64,
    /// Starting balance of every account.
    pub initial_balance: i64,
    /// Largest transfer amount.
    pub max_amount: i64,
    /// Forced-flush policy for the scheduled run.
    pub flush: FlushPolicy,
}

/// Inputs of [`run_conflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictParams {
    /// Lanes per vector.
    pub lanes: usize,
    /// Vectors tested.
    pub iterations: usize,
    /// Value seed.
    pub seed: u64,
}

/// Drains a random queue with the batch scheduler and times it.
#[instrument(level = "debug")]
pub fn run_schedule_batch(p: ScheduleParams) -> Result<Report> {
    ensure!(
        p.qlen > 0 && p.modulo > 0,
        "queue length and modulo must both be greater than zero"
    );
    let qlen = p.qlen as usize;
    let mut keys = random_keys(qlen, p.modulo, p.seed);
    let mut tokens: Vec<u32> = (0..p.qlen).collect();

    let start = Instant::now();
    let mut batches = 0usize;
    let mut i = 0;
    while i < qlen {
        i += schedule_batch(&mut keys[i..], &mut tokens[i..], qlen - i);
        batches += 1;
    }
    let elapsed = start.elapsed();
    black_box((&keys, &tokens));

    info!(
        qlen,
        modulo = p.modulo,
        batches,
        ?elapsed,
        "schedule_batch complete"
    );
    Ok(Report::new(format!("schedule_batch({}, {})", p.qlen, p.modulo))
        .row("batches", batches)
        .row("total time", format!("{elapsed:?}"))
        .row("ns per call", ns_per(elapsed, batches))
        .row("ns per item", ns_per(elapsed, qlen))
        .row("mean batch size", ratio(qlen, batches)))
}

/// Applies the same random transfers sequentially, through the guarded
/// protocol and through scheduling plus the guarded protocol, then checks the
/// three tables are byte-identical.
#[instrument(level = "debug")]
pub fn run_accounts(p: AccountsParams) -> Result<Report> {
    ensure!(p.accounts > 0, "account count must be greater than zero");
    let transfers = random_transfers(p.transfers, p.accounts, p.max_amount, p.seed);
    let base = AccountTable::new(p.accounts, p.initial_balance);
    base.validate(&transfers)
        .context("generated transfers reference missing accounts")?;

    let mut sequential = base.clone();
    let start = Instant::now();
    sequential.apply_sequential(&transfers);
    let seq_time = start.elapsed();

    let mut guarded = base.clone();
    let start = Instant::now();
    let guard = guarded.apply_guarded(&transfers);
    let guard_time = start.elapsed();

    let mut scheduled = base;
    let start = Instant::now();
    let outcome = scheduled.apply_scheduled(&transfers, p.flush, &TracingTelemetrySink);
    let sched_time = start.elapsed();
    debug!(?guard, drain = ?outcome.drain, "account runs complete");

    ensure!(
        guarded.as_bytes() == sequential.as_bytes(),
        "guarded table diverged from the sequential reference"
    );
    ensure!(
        scheduled.as_bytes() == sequential.as_bytes(),
        "scheduled table diverged from the sequential reference"
    );

    info!(
        accounts = p.accounts,
        transfers = p.transfers,
        "account tables agree"
    );
    Ok(Report::new(format!("accounts({}, {})", p.accounts, p.transfers))
        .row("sequential ns per transfer", ns_per(seq_time, p.transfers))
        .row("guarded ns per transfer", ns_per(guard_time, p.transfers))
        .row("scheduled ns per transfer", ns_per(sched_time, p.transfers))
        .row("guarded rounds", guard.rounds)
        .row("truncated rounds", guard.truncated_rounds)
        .row("scalar fallbacks", guard.scalar_ops)
        .row(
            "mean ops per round",
            ratio(guard.parallel_ops, guard.rounds - guard.scalar_ops),
        )
        .row("scheduler calls", outcome.drain.calls)
        .row("forced flushes", outcome.drain.flushes)
        .row("held-back transfers", outcome.held_back)
        .row("guarded vs sequential", "identical")
        .row("scheduled vs sequential", "identical"))
}

/// Runs conflict detection over random lane vectors.
#[instrument(level = "debug")]
pub fn run_conflict(p: ConflictParams) -> Result<Report> {
    ensure!(
        (1..=MAX_LANES).contains(&p.lanes),
        "lanes must be between 1 and {MAX_LANES}"
    );
    ensure!(p.iterations > 0, "iterations must be greater than zero");
    let total = p
        .lanes
        .checked_mul(p.iterations)
        .context("lanes * iterations overflows")?;
    // values drawn from four times the lane count
    let domain = u32::try_from(4 * p.lanes).context("lane count out of range")?;
    let values = random_keys(total, domain, p.seed);

    let start = Instant::now();
    let mut conflicting = 0usize;
    let mut vectors_hit = 0usize;
    for v in values.chunks_exact(p.lanes) {
        let m = conflict_mask(black_box(v));
        conflicting += m.count();
        vectors_hit += usize::from(!m.is_empty());
    }
    let elapsed = start.elapsed();

    info!(
        lanes = p.lanes,
        iterations = p.iterations,
        conflicting,
        "conflict sweep complete"
    );
    Ok(Report::new(format!("conflict({}, {})", p.lanes, p.iterations))
        .row("value domain", domain)
        .row("conflicting lanes", conflicting)
        .row("conflicting lane share", ratio(conflicting, total))
        .row("vectors with a conflict", vectors_hit)
        .row("ns per vector", ns_per(elapsed, p.iterations)))
}

/// Writes `config` to `store` so it can be edited by hand.
#[instrument(level = "debug", skip(store, config), fields(path = %store.path().display()))]
pub fn run_init_config(
    store: &impl ConfigStore,
    config: &JigConfig,
    force: bool,
) -> Result<Report> {
    write_config(store, config, force)?;
    info!(path = %store.path().display(), "jig config written");
    Ok(Report::new("init-config")
        .row("path", store.path().display())
        .row("seed", config.seed)
        .row("log level", &config.log_level))
}
