// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! lanesched-jig: performance harness for `lanesched-core`.
//!
//! Each subcommand generates seeded inputs, runs one measurement and returns
//! a [`Report`](report::Report) that the binary prints as a table.
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod report;
pub mod warmup;

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber, logging to stderr.
///
/// `RUST_LOG` wins over `fallback`; an unparsable `fallback` degrades to `info`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(fallback: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_tracing_init_is_rejected() {
        // the first call may already lose to another test's subscriber
        let _ = init_tracing("debug");
        assert!(init_tracing("info").is_err());
    }
}
