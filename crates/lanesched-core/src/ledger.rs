// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Accounts table driven by the scheduler and the guarded update protocol.
//!
//! Records are plain-old-data so whole tables can be compared byte for byte.

use std::hash::Hasher;

use bytemuck::{Pod, Zeroable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHasher;
use thiserror::Error;
use tracing::debug;

use crate::guard::{apply_guarded, apply_sequential, GuardStats, GuardedUpdate};
use crate::queue::{BatchKind, DrainStats, FlushPolicy, WorkQueue};
use crate::telemetry::TelemetrySink;

/// One account record.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Account {
    /// Current balance.
    pub balance: i64,
    /// Id of the last transfer that touched this account (0 = never touched).
    pub last_txn: u64,
}

/// Moves `amount` from account `from` to account `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Transfer id, recorded in `last_txn` of both accounts.
    pub id: u64,
    /// Debited account.
    pub from: usize,
    /// Credited account.
    pub to: usize,
    /// Amount moved.
    pub amount: i64,
}

impl GuardedUpdate<Account, 2> for Transfer {
    #[inline]
    fn refs(&self) -> [usize; 2] {
        [self.from, self.to]
    }

    #[inline]
    fn update(&self, records: &mut [Account; 2]) {
        let [from, to] = records;
        from.balance = from.balance.wrapping_sub(self.amount);
        from.last_txn = self.id;
        to.balance = to.balance.wrapping_add(self.amount);
        to.last_txn = self.id;
    }

    #[inline]
    fn apply_scalar(&self, store: &mut [Account]) {
        let from = &mut store[self.from];
        from.balance = from.balance.wrapping_sub(self.amount);
        from.last_txn = self.id;
        let to = &mut store[self.to];
        to.balance = to.balance.wrapping_add(self.amount);
        to.last_txn = self.id;
    }
}

/// Errors raised by [`AccountTable::validate`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    /// A transfer names an account the table does not have.
    #[error("transfer #{transfer} references account {account}, table has {len} accounts")]
    AccountOutOfRange {
        /// Position of the offending transfer.
        transfer: usize,
        /// Account index referenced.
        account: usize,
        /// Number of accounts in the table.
        len: usize,
    },
}

/// Result of [`AccountTable::apply_scheduled`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduledOutcome {
    /// Scheduling counters.
    pub drain: DrainStats,
    /// Guarded-protocol counters summed over all parallel batches.
    pub guard: GuardStats,
    /// Transfers that ran after their scheduled batch, waiting on an earlier
    /// transfer that shares an account.
    pub held_back: usize,
    /// Arrival indices of the transfers in the order they were applied.
    pub order: Vec<usize>,
}

/// Per-account arrival order of the transfers touching each account.
///
/// A transfer may run once it is next in line on both of its accounts.
struct ArrivalOrder {
    touches: Vec<Vec<usize>>,
    applied: Vec<usize>,
}

impl ArrivalOrder {
    fn new(accounts: usize, transfers: &[Transfer]) -> Self {
        let mut touches = vec![Vec::new(); accounts];
        for (i, t) in transfers.iter().enumerate() {
            touches[t.from].push(i);
            if t.to != t.from {
                touches[t.to].push(i);
            }
        }
        Self {
            touches,
            applied: vec![0; accounts],
        }
    }

    fn is_next(&self, account: usize, i: usize) -> bool {
        self.touches[account].get(self.applied[account]) == Some(&i)
    }

    fn try_advance(&mut self, i: usize, t: &Transfer) -> bool {
        if !(self.is_next(t.from, i) && self.is_next(t.to, i)) {
            return false;
        }
        self.applied[t.from] += 1;
        if t.to != t.from {
            self.applied[t.to] += 1;
        }
        true
    }

    /// Moves every runnable transfer from `held` into `ready`, in arrival
    /// order. Predecessors always arrive earlier, so one ascending pass
    /// releases everything that can run.
    fn release(&mut self, transfers: &[Transfer], held: &mut Vec<usize>, ready: &mut Vec<usize>) {
        held.sort_unstable();
        held.retain(|&i| {
            if self.try_advance(i, &transfers[i]) {
                ready.push(i);
                false
            } else {
                true
            }
        });
    }
}

/// Scheduling key for a transfer: the debited account, hashed down to 32 bits.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn account_key(account: usize) -> u32 {
    let mut h = FxHasher::default();
    h.write_usize(account);
    h.finish() as u32
}

/// Fixed-size table of [`Account`] records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTable {
    accounts: Vec<Account>,
}

impl AccountTable {
    /// `len` accounts, each holding `initial_balance`.
    pub fn new(len: usize, initial_balance: i64) -> Self {
        Self {
            accounts: vec![
                Account {
                    balance: initial_balance,
                    last_txn: 0,
                };
                len
            ],
        }
    }

    /// One account per balance.
    pub fn from_balances(balances: impl IntoIterator<Item = i64>) -> Self {
        Self {
            accounts: balances
                .into_iter()
                .map(|balance| Account {
                    balance,
                    last_txn: 0,
                })
                .collect(),
        }
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the table holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Account records.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Balances in account order.
    pub fn balances(&self) -> Vec<i64> {
        self.accounts.iter().map(|a| a.balance).collect()
    }

    /// Raw bytes of the whole table.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.accounts)
    }

    /// Checks that every transfer addresses existing accounts.
    ///
    /// # Errors
    /// Returns [`LedgerError::AccountOutOfRange`] for the first transfer that
    /// names a missing account.
    pub fn validate(&self, transfers: &[Transfer]) -> Result<(), LedgerError> {
        let len = self.len();
        for (transfer, t) in transfers.iter().enumerate() {
            if let Some(account) = [t.from, t.to].into_iter().find(|&a| a >= len) {
                return Err(LedgerError::AccountOutOfRange {
                    transfer,
                    account,
                    len,
                });
            }
        }
        Ok(())
    }

    /// Applies transfers one at a time in order.
    pub fn apply_sequential(&mut self, transfers: &[Transfer]) {
        apply_sequential::<Account, Transfer, 2>(&mut self.accounts, transfers);
    }

    /// Applies transfers in arrival order through the guarded protocol.
    pub fn apply_guarded(&mut self, transfers: &[Transfer]) -> GuardStats {
        apply_guarded::<Account, Transfer, 2>(&mut self.accounts, transfers)
    }

    /// Schedules transfers by debited account, then applies every parallel
    /// batch through the guarded protocol and every forced flush sequentially.
    ///
    /// The scheduler only keeps debits to one account in order. A scheduled
    /// transfer that would overtake an earlier transfer on either of its
    /// accounts is held until that transfer has run, so the final table is
    /// byte-identical to arrival-order sequential application.
    pub fn apply_scheduled(
        &mut self,
        transfers: &[Transfer],
        policy: FlushPolicy,
        sink: &dyn TelemetrySink,
    ) -> ScheduledOutcome {
        let mut queue = WorkQueue::with_capacity(transfers.len());
        for (i, t) in transfers.iter().enumerate() {
            queue.push(account_key(t.from), i);
        }

        let accounts = &mut self.accounts;
        let mut arrival = ArrivalOrder::new(accounts.len(), transfers);
        let mut order = Vec::with_capacity(transfers.len());
        let mut guard = GuardStats::default();
        let mut held = Vec::new();
        let mut ready = Vec::new();
        let mut held_back = 0;
        let mut batch = Vec::new();
        let drain = queue.drain(policy, sink, |view| {
            held.extend_from_slice(view.tokens);
            ready.clear();
            arrival.release(transfers, &mut held, &mut ready);
            held_back += view
                .tokens
                .iter()
                .filter(|i| held.binary_search(i).is_ok())
                .count();

            batch.clear();
            batch.extend(ready.iter().map(|&i| transfers[i]));
            order.extend_from_slice(&ready);
            match view.kind {
                BatchKind::Parallel => {
                    guard += apply_guarded::<Account, Transfer, 2>(accounts, &batch);
                }
                BatchKind::Sequential => {
                    apply_sequential::<Account, Transfer, 2>(accounts, &batch);
                }
            }
        });

        ready.clear();
        arrival.release(transfers, &mut held, &mut ready);
        debug_assert!(held.is_empty(), "held transfers left after drain");
        batch.clear();
        batch.extend(ready.iter().map(|&i| transfers[i]));
        order.extend_from_slice(&ready);
        apply_sequential::<Account, Transfer, 2>(accounts, &batch);

        sink.on_guarded(&guard);
        debug!(
            transfers = transfers.len(),
            batches = drain.parallel_batches,
            held_back,
            "scheduled apply complete"
        );

        ScheduledOutcome {
            drain,
            guard,
            held_back,
            order,
        }
    }
}

/// Deterministic transfer generator for fuzzing and benchmarks.
///
/// `from` and `to` are uniform over `0..accounts` and may coincide; amounts
/// are uniform over `0..=max_amount`. Ids start at 1.
pub fn random_transfers(n: usize, accounts: usize, max_amount: i64, seed: u64) -> Vec<Transfer> {
    if accounts == 0 {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (1..=n as u64)
        .map(|id| Transfer {
            id,
            from: rng.gen_range(0..accounts),
            to: rng.gen_range(0..accounts),
            amount: rng.gen_range(0..=max_amount.max(0)),
        })
        .collect()
}
