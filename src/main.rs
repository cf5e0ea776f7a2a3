//! src/main.rs
//!
//! The entrypoint for the `op-apitest` binary.
//!
//! This file is intentionally minimal. Its sole responsibilities are:
//!   - Loading the configuration.
//!   - Initializing the tracing subscriber.
//!   - Running the suites and turning the result into an exit status.

use anyhow::Context;
use op_apitest::{App, Config};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<ExitCode> {
    let config = Config::load().context("Failed to load configuration")?;

    // `RUST_LOG` wins over the configured filter.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let summary = App::new(config)?.run()?;
    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!(
            failed = summary.failed(),
            leaked = summary.leaked,
            "💥 Null-argument suites reported failures"
        );
        Ok(ExitCode::FAILURE)
    }
}
