// src/plan/mod.rs

//! The benchmark plan: an ordered, immutable list of actions.
//!
//! - [`discovery`] finds probe files and pairs them with their originals.
//! - [`builder`] turns declared scripts, settings and discovered pairs into a
//!   [`Plan`].
//!
//! Execution lives in [`crate::exec`].

pub mod builder;
pub mod discovery;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub use builder::PlanBuilder;
pub use discovery::{compare_pairs, discover_modifications, ModificationPair};

/// A program plus arguments, spawned without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What a single plan step does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Capture CPU, memory and uptime of the host.
    SystemInfo,
    /// Run a command and wait for it to close.
    RunCommand(CommandSpec),
    /// Start a long-lived watch-mode build and leave it running.
    StartWatchProcess(CommandSpec),
    /// Start the file-change latency monitor and leave it running.
    StartLatencyMonitor,
    /// Overwrite `path` with `content`.
    ModifyFile { path: PathBuf, content: Vec<u8> },
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::SystemInfo => "system-info",
            ActionKind::RunCommand(_) => "run",
            ActionKind::StartWatchProcess(_) => "watch",
            ActionKind::StartLatencyMonitor => "latency-monitor",
            ActionKind::ModifyFile { .. } => "modify-file",
        }
    }
}

/// One step of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Shown as `ACTION: <title>`.
    pub title: String,
    /// Script text shown as `COMMAND: <command>`, when there is one.
    pub command: Option<String>,
    pub kind: ActionKind,
    /// Settle time before the next step. `None` uses the global default.
    pub delay: Option<Duration>,
}

impl Action {
    pub fn new(title: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            title: title.into(),
            command: None,
            kind,
            delay: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay to wait after this action, falling back to `default`.
    pub fn delay_or(&self, default: Duration) -> Duration {
        self.delay.unwrap_or(default)
    }
}

/// Ordered list of actions; insertion order is execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    actions: Vec<Action>,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn get(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Number of actions of the given kind label (see [`ActionKind::label`]).
    pub fn count_kind(&self, label: &str) -> usize {
        self.actions.iter().filter(|a| a.kind.label() == label).count()
    }
}
