// src/types.rs

use std::fmt;
use std::str::FromStr;

use crate::errors::BenchError;

/// Build tools the harness knows how to benchmark.
///
/// The tool name doubles as the prefix of its declared scripts
/// (`<tool>:initial`, `<tool>:cache`, `<tool>:watch`) and as the name of its
/// output directory under `out/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Fastpack,
    Webpack,
    Parcel,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Fastpack, Tool::Webpack, Tool::Parcel];

    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Fastpack => "fastpack",
            Tool::Webpack => "webpack",
            Tool::Parcel => "parcel",
        }
    }

    /// Name of the script declaring `target` for this tool.
    pub fn script_key(self, target: Target) -> String {
        format!("{}:{}", self.as_str(), target.as_str())
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| BenchError::UnknownTool(s.to_string()))
    }
}

/// Benchmark phase a declared script belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Cold build.
    Initial,
    /// Build with a warm persistent cache.
    Cache,
    /// Long-lived watch-mode build.
    Watch,
}

impl Target {
    /// Targets that are run to completion `N_RUNS` times each, in order.
    pub const TIMED: [Target; 2] = [Target::Initial, Target::Cache];

    pub fn as_str(self) -> &'static str {
        match self {
            Target::Initial => "initial",
            Target::Cache => "cache",
            Target::Watch => "watch",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
