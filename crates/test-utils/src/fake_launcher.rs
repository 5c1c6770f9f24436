use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use bundlebench::exec::{
    EventSender, ExecEvent, Launcher, OutputMode, OutputStream, ProcessHandle, ProcessId,
};
use bundlebench::plan::CommandSpec;

/// What the fake launcher was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launched {
    Command { id: ProcessId, command: String },
    Monitor { id: ProcessId },
}

/// A launcher that never spawns anything:
/// - commands print `ran <command>` (plus one stderr line) and exit with 0,
///   unless their text contains one of the `long_lived` markers, in which
///   case they keep "running" until terminated;
/// - the monitor prints one `CHECK MTIME:` line and keeps running.
///
/// Every launch and every explicit termination is recorded.
#[derive(Debug, Clone)]
pub struct FakeLauncher {
    launched: Arc<Mutex<Vec<Launched>>>,
    terminated: Arc<Mutex<Vec<ProcessId>>>,
    long_lived: Vec<String>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            launched: Arc::new(Mutex::new(Vec::new())),
            terminated: Arc::new(Mutex::new(Vec::new())),
            long_lived: vec![":watch".to_string()],
        }
    }

    pub fn launched(&self) -> Vec<Launched> {
        self.launched.lock().unwrap().clone()
    }

    pub fn terminated(&self) -> Vec<ProcessId> {
        self.terminated.lock().unwrap().clone()
    }

    fn running_handle(&self, id: ProcessId) -> ProcessHandle {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let terminated = Arc::clone(&self.terminated);
        let task = tokio::spawn(async move {
            if cancel_rx.await.is_ok() {
                terminated.lock().unwrap().push(id);
            }
        });
        ProcessHandle::new(id, cancel_tx, task)
    }
}

impl Default for FakeLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl Launcher for FakeLauncher {
    fn spawn_command(
        &mut self,
        id: ProcessId,
        command: &CommandSpec,
        mode: OutputMode,
        events: EventSender,
    ) -> anyhow::Result<ProcessHandle> {
        let text = command.to_string();
        self.launched.lock().unwrap().push(Launched::Command {
            id,
            command: text.clone(),
        });

        let stdout = match mode {
            OutputMode::Verbatim => format!("ran {text}\n"),
            OutputMode::Prefixed(prefix) => format!("{prefix}ran {text}\n"),
        };
        events.send(ExecEvent::Output {
            stream: OutputStream::Stdout,
            chunk: stdout,
        })?;

        if self.long_lived.iter().any(|marker| text.contains(marker.as_str())) {
            return Ok(self.running_handle(id));
        }

        events.send(ExecEvent::Output {
            stream: OutputStream::Stderr,
            chunk: "STDERR: real\t0m0.010s\n".to_string(),
        })?;
        events.send(ExecEvent::Exited { id, code: Some(0) })?;
        Ok(self.running_handle(id))
    }

    fn spawn_monitor(&mut self, id: ProcessId, events: EventSender) -> anyhow::Result<ProcessHandle> {
        self.launched.lock().unwrap().push(Launched::Monitor { id });
        events.send(ExecEvent::Output {
            stream: OutputStream::Stdout,
            chunk: "CHECK MTIME: Initialization step 1.\n".to_string(),
        })?;
        Ok(self.running_handle(id))
    }
}
