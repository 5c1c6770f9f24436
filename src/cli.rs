// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};
use tracing::Level;

/// Command-line arguments for `bundlebench`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bundlebench",
    version,
    about = "Benchmark initial, cached and watch-mode builds of a JavaScript bundler.",
    long_about = None
)]
pub struct CliArgs {
    /// Build tool under test (fastpack, webpack or parcel).
    ///
    /// Validated against the known set when the run starts, so an unknown
    /// name is reported as `Unknown bundler: <name>`.
    #[arg(value_name = "TOOL")]
    pub tool: String,

    /// Project manifest declaring the `<tool>:<target>` scripts.
    ///
    /// `.toml` files are read from a `[scripts]` table, anything else as a
    /// `package.json`-style JSON document.
    #[arg(long, value_name = "PATH", default_value = "package.json")]
    pub project: String,

    /// Program used to run declared scripts (`<runner> -s <script>`).
    #[arg(long, value_name = "PROGRAM", default_value = "yarn")]
    pub runner: String,

    /// Source tree, relative to the project root. Probe files are discovered
    /// here and writes below it start a latency measurement.
    #[arg(long, value_name = "DIR", default_value = "src")]
    pub src_dir: String,

    /// Output root, relative to the project root. Each known tool writes
    /// into `<out-dir>/<tool>`.
    #[arg(long, value_name = "DIR", default_value = "out")]
    pub out_dir: String,

    /// File extension (without the dot) the latency monitor looks at.
    #[arg(long, value_name = "EXT", default_value = "js")]
    pub extension: String,

    /// File-change subscription service binary.
    #[arg(long, value_name = "PROGRAM", default_value = "watchman")]
    pub watchman: String,

    /// Directory the `<tool>.log` artifact is written to.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub log_dir: String,

    /// Diagnostics level on stderr (error, warn, info, debug, trace).
    #[arg(
        long,
        value_enum,
        value_name = "LEVEL",
        env = "BUNDLEBENCH_LOG",
        default_value = "info",
        ignore_case = true
    )]
    pub log_level: LogLevel,

    /// Build and print the plan, but don't execute any step.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    #[value(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
