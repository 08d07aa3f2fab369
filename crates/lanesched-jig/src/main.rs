// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! lanesched-jig
//!
//! Runs one measurement over the lane scheduler and prints the results.
use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use lanesched_jig::cli::{dispatch, Cli};
use lanesched_jig::config::load_config;
use lanesched_jig::init_tracing;
use lanesched_jig::warmup::warm_up_lanes;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("failed to load jig config")?;
    init_tracing(cli.log_filter(&config))
        .context("failed to install tracing subscriber")?;
    debug!(?config, "config resolved");

    if !cli.no_warmup && cli.command.is_measurement() {
        let checksum = warm_up_lanes(config.warmup_rounds);
        info!(
            rounds = config.warmup_rounds,
            checksum,
            "lane warm-up complete"
        );
    }

    let report = dispatch(&cli, &config)?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", report.render()).context("failed to write report")?;
    Ok(())
}
