// src/exec/mod.rs

//! Plan execution layer.
//!
//! - [`process`] spawns one external process and streams its output.
//! - [`mutator`] overwrites files for the modify/revert steps.
//! - [`sysinfo`] gathers static host information.
//! - [`log_buffer`] accumulates the benchmark capture and owns its format.
//! - [`launcher`] provides the `Launcher` trait the executor spawns through,
//!   and the `RealLauncher` used in production. Tests swap in a fake.
//! - [`executor`] walks the plan step by step.
//!
//! Every spawned process reports through one unbounded channel of
//! [`ExecEvent`]s. The executor task is the only reader of that channel and
//! the only writer of the log buffer.

pub mod executor;
pub mod launcher;
pub mod log_buffer;
pub mod mutator;
pub mod process;
pub mod sysinfo;

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

pub use executor::{ActionExecutor, ExecutorOptions, RunSummary};
pub use launcher::{Launcher, RealLauncher};
pub use log_buffer::LogBuffer;
pub use process::{spawn_process, OutputMode};

/// Identifies one spawned process for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Notifications from running processes to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    /// Already formatted text to append to the log.
    Output { stream: OutputStream, chunk: String },
    /// The process closed; all of its output was sent before this.
    Exited { id: ProcessId, code: Option<i32> },
}

pub type EventSender = mpsc::UnboundedSender<ExecEvent>;

/// Handle for a spawned process (or in-process service).
///
/// - `cancel` asks the owning task to kill the process.
/// - `task` is the Tokio task that owns the child.
///
/// Dropping the handle without [`terminate`](Self::terminate) also kills the
/// process, so the executor keeps every handle until it is done with it.
#[derive(Debug)]
pub struct ProcessHandle {
    id: ProcessId,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ProcessHandle {
    pub fn new(id: ProcessId, cancel: oneshot::Sender<()>, task: JoinHandle<()>) -> Self {
        Self {
            id,
            cancel: Some(cancel),
            task,
        }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Kill the process (if still running) and wait for its task to finish.
    pub async fn terminate(mut self) {
        if let Some(cancel) = self.cancel.take() {
            if cancel.send(()).is_err() {
                debug!(process = %self.id, "process already finished before termination");
            }
        }
        if let Err(e) = (&mut self.task).await {
            debug!(process = %self.id, error = %e, "process task ended abnormally");
        }
    }
}
