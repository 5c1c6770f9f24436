// src/exec/launcher.rs

//! Pluggable process launching.
//!
//! The executor spawns everything through a `Launcher` instead of calling
//! [`spawn_process`] directly. Production uses [`RealLauncher`]; tests can
//! provide a launcher that records what was started and reports exits
//! without running anything.

use std::sync::Arc;

use anyhow::Result;

use crate::exec::process::{spawn_process, OutputMode};
use crate::exec::{EventSender, ProcessHandle, ProcessId};
use crate::fs::FileSystem;
use crate::plan::CommandSpec;
use crate::watch::monitor::{spawn_monitor, MonitorSettings};

/// Trait abstracting how the executor starts processes.
pub trait Launcher: Send {
    /// Start `command`. Output and the final exit are reported on `events`.
    fn spawn_command(
        &mut self,
        id: ProcessId,
        command: &CommandSpec,
        mode: OutputMode,
        events: EventSender,
    ) -> Result<ProcessHandle>;

    /// Start the latency monitor. It reports output only, never an exit.
    fn spawn_monitor(&mut self, id: ProcessId, events: EventSender) -> Result<ProcessHandle>;
}

/// Launcher used in production: real subprocesses via `tokio::process`.
#[derive(Debug, Clone)]
pub struct RealLauncher {
    fs: Arc<dyn FileSystem>,
    monitor: MonitorSettings,
}

impl RealLauncher {
    pub fn new(fs: Arc<dyn FileSystem>, monitor: MonitorSettings) -> Self {
        Self { fs, monitor }
    }
}

impl Launcher for RealLauncher {
    fn spawn_command(
        &mut self,
        id: ProcessId,
        command: &CommandSpec,
        mode: OutputMode,
        events: EventSender,
    ) -> Result<ProcessHandle> {
        spawn_process(id, command, mode, events)
    }

    fn spawn_monitor(&mut self, id: ProcessId, events: EventSender) -> Result<ProcessHandle> {
        spawn_monitor(id, &self.monitor, Arc::clone(&self.fs), events)
    }
}
