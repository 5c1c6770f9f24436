// src/logging.rs

//! Diagnostics for `bundlebench`.
//!
//! The level is resolved by the CLI layer (`--log-level`, then
//! `BUNDLEBENCH_LOG`, then `info`). Everything here goes to stderr: stdout
//! carries the live mirror of the benchmark capture and must stay clean.

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::fmt;

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(level: Level) -> Result<()> {
    fmt()
        .with_max_level(level)
        .with_target(level >= Level::DEBUG)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing the log subscriber: {e}"))
}
