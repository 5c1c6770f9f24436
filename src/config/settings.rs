// src/config/settings.rs

//! Repetition count and inter-step delays, read from the environment.

use std::time::Duration;

use crate::errors::{BenchError, Result};

pub const N_RUNS_VAR: &str = "N_RUNS";
pub const DELAY_VAR: &str = "DELAY";
pub const WATCH_INIT_DELAY_VAR: &str = "BUNDLER_WATCH_INITIALIZATION_DELAY";
pub const MONITOR_INIT_DELAY_VAR: &str = "CHECK_MTIME_INITIALIZATION_DELAY";
pub const MODIFICATION_DELAY_VAR: &str = "AFTER_FILE_MODIFICATION_DELAY";

/// Timing configuration shared by the plan builder and the executor.
///
/// All values come from positive integers in the environment (seconds for
/// delays). Fields are public so tests can build settings with zero delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Repetitions of each timed script (`N_RUNS`, default 3).
    pub runs: u32,
    /// Settle time after any action without its own delay (`DELAY`, default 1).
    pub delay: Duration,
    /// Time given to the watch-mode build before continuing
    /// (`BUNDLER_WATCH_INITIALIZATION_DELAY`, default 3).
    pub watch_init_delay: Duration,
    /// Time given to the latency monitor to subscribe
    /// (`CHECK_MTIME_INITIALIZATION_DELAY`, default 3).
    pub monitor_init_delay: Duration,
    /// Time the watched build gets to react to each file write
    /// (`AFTER_FILE_MODIFICATION_DELAY`, default 3).
    pub modification_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            runs: 3,
            delay: Duration::from_secs(1),
            watch_init_delay: Duration::from_secs(3),
            monitor_init_delay: Duration::from_secs(3),
            modification_delay: Duration::from_secs(3),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// Unset or empty variables fall back to their defaults; anything that is
    /// not an integer >= 1 is rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let seconds = |var: &'static str, default: Duration| -> Result<Duration> {
            positive_value(&lookup, var, default.as_secs()).map(Duration::from_secs)
        };

        let runs = positive_value(&lookup, N_RUNS_VAR, u64::from(defaults.runs))?;
        let runs = u32::try_from(runs).map_err(|_| BenchError::InvalidSetting {
            var: N_RUNS_VAR,
            value: runs.to_string(),
        })?;

        Ok(Self {
            runs,
            delay: seconds(DELAY_VAR, defaults.delay)?,
            watch_init_delay: seconds(WATCH_INIT_DELAY_VAR, defaults.watch_init_delay)?,
            monitor_init_delay: seconds(MONITOR_INIT_DELAY_VAR, defaults.monitor_init_delay)?,
            modification_delay: seconds(MODIFICATION_DELAY_VAR, defaults.modification_delay)?,
        })
    }
}

fn positive_value<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(default),
    };

    match raw.trim().parse::<u64>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(BenchError::InvalidSetting { var, value: raw }),
    }
}
