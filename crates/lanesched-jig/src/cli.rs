// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line surface and dispatch.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lanesched_core::FlushPolicy;

use crate::commands::{
    run_accounts, run_conflict, run_init_config, run_schedule_batch, AccountsParams,
    ConflictParams, ScheduleParams,
};
use crate::config::{ConfigFile, JigConfig};
use crate::report::Report;

/// Lane scheduler performance jig.
#[derive(Parser, Debug)]
#[command(author, version, about = "Lane scheduler performance jig")]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. `debug`, `lanesched_core=trace`)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Skip the vector-unit warm-up loop
    #[arg(long, global = true)]
    pub no_warmup: bool,

    /// Measurement to run
    #[command(subcommand)]
    pub command: Command,
}

/// Jig measurements.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Drain a random queue with the batch scheduler
    ScheduleBatch {
        /// Queue length
        #[arg(long)]
        qlen: Option<u32>,
        /// Keys are reduced modulo this value
        #[arg(long)]
        modulo: Option<u32>,
        /// Key seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Compare sequential, guarded and scheduled account updates
    Accounts {
        /// Number of accounts
        #[arg(long)]
        accounts: Option<usize>,
        /// Number of transfers
        #[arg(long)]
        transfers: Option<usize>,
        /// Transfer seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Conflict detection over random lane vectors
    Conflict {
        /// Lanes per vector (1..=64)
        #[arg(long)]
        lanes: Option<usize>,
        /// Value seed
        #[arg(long)]
        seed: Option<u64>,
        /// Vectors tested
        #[arg(long)]
        iterations: Option<usize>,
    },
    /// Write the resolved config to the config file
    InitConfig {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

impl Command {
    /// Returns true for the timed measurements.
    pub const fn is_measurement(&self) -> bool {
        !matches!(self, Self::InitConfig { .. })
    }
}

impl Cli {
    /// Log filter: `--log-level`, else the config value.
    pub fn log_filter<'a>(&'a self, config: &'a JigConfig) -> &'a str {
        self.log_level.as_deref().unwrap_or(&config.log_level)
    }
}

/// Runs the parsed command, filling unset flags from `config`.
pub fn dispatch(cli: &Cli, config: &JigConfig) -> Result<Report> {
    match cli.command {
        Command::ScheduleBatch { qlen, modulo, seed } => run_schedule_batch(ScheduleParams {
            qlen: qlen.unwrap_or(config.schedule.qlen),
            modulo: modulo.unwrap_or(config.schedule.modulo),
            seed: seed.unwrap_or(config.seed),
        }),
        Command::Accounts {
            accounts,
            transfers,
            seed,
        } => run_accounts(AccountsParams {
            accounts: accounts.unwrap_or(config.accounts.accounts),
            transfers: transfers.unwrap_or(config.accounts.transfers),
            seed: seed.unwrap_or(config.seed),
            initial_balance: config.accounts.initial_balance,
            max_amount: config.accounts.max_amount,
            flush: FlushPolicy::from(config.flush),
        }),
        Command::Conflict {
            lanes,
            seed,
            iterations,
        } => run_conflict(ConflictParams {
            lanes: lanes.unwrap_or(config.conflict.lanes),
            iterations: iterations.unwrap_or(config.conflict.iterations),
            seed: seed.unwrap_or(config.seed),
        }),
        Command::InitConfig { force } => {
            let file = ConfigFile::resolve(cli.config.as_deref())?;
            run_init_config(&file, config, force)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "lanesched-jig",
            "--log-level",
            "debug",
            "schedule-batch",
            "--qlen",
            "32",
        ])
        .expect("parse");
        let mut config = JigConfig::default();
        config.schedule.modulo = 1;
        config.log_level = "warn".into();
        assert_eq!(cli.log_filter(&config), "debug");

        let report = dispatch(&cli, &config).expect("dispatch");
        assert_eq!(report.title(), "schedule_batch(32, 1)");
        assert_eq!(report.get("batches"), Some("32"));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let args = ["lanesched-jig", "conflict", "--lanes", "8", "--no-warmup"];
        let cli = Cli::try_parse_from(args).expect("parse");
        assert!(cli.no_warmup);
        assert_eq!(
            cli.command,
            Command::Conflict {
                lanes: Some(8),
                seed: None,
                iterations: None,
            }
        );
    }
}
