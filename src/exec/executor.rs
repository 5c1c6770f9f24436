// src/exec/executor.rs

//! Walks the plan one action at a time.
//!
//! Each action starts its side effect, then the executor waits: for a run
//! command, until the process closes and the settle delay elapsed; for
//! everything else, only the delay. Watch builds and the latency monitor are
//! left running in the background and killed when the plan is done.
//!
//! While waiting, the executor drains process output into the log buffer, so
//! it is the single writer of the log.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::exec::launcher::Launcher;
use crate::exec::log_buffer::LogBuffer;
use crate::exec::process::OutputMode;
use crate::exec::sysinfo::{self, UPTIME_PREFIX};
use crate::exec::{mutator, EventSender, ExecEvent, OutputStream, ProcessHandle, ProcessId};
use crate::fs::FileSystem;
use crate::plan::{Action, ActionKind, Plan};

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Settle time for actions without their own delay.
    pub default_delay: Duration,
    /// Where the log buffer is written at the end of the run.
    pub log_path: PathBuf,
    /// Mirror the capture to stdout while running.
    pub mirror_console: bool,
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub actions: usize,
    pub log_path: PathBuf,
    pub bytes: usize,
    pub stderr_lines: usize,
}

pub struct ActionExecutor<L: Launcher> {
    plan: Plan,
    options: ExecutorOptions,
    launcher: L,
    fs: Arc<dyn FileSystem>,
    log: LogBuffer,
    events_tx: EventSender,
    events_rx: mpsc::UnboundedReceiver<ExecEvent>,
    /// Long-lived processes started by the plan, killed at finalize.
    background: Vec<ProcessHandle>,
    next_id: u64,
}

impl<L: Launcher> std::fmt::Debug for ActionExecutor<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("plan", &self.plan.len())
            .field("options", &self.options)
            .field("background", &self.background.len())
            .finish_non_exhaustive()
    }
}

impl<L: Launcher> ActionExecutor<L> {
    pub fn new(plan: Plan, launcher: L, fs: Arc<dyn FileSystem>, options: ExecutorOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let log = LogBuffer::new(options.mirror_console);
        Self {
            plan,
            options,
            launcher,
            fs,
            log,
            events_tx,
            events_rx,
            background: Vec::new(),
            next_id: 0,
        }
    }

    /// Run every action in order, then finalize.
    ///
    /// On a fatal error the background processes are killed and the error is
    /// returned; the log is not written in that case.
    pub async fn run(mut self) -> Result<RunSummary> {
        let plan = std::mem::take(&mut self.plan);
        info!(actions = plan.len(), "executor started");

        for (index, action) in plan.iter().enumerate() {
            if let Err(err) = self.run_one(index, action).await {
                error!(index, title = %action.title, error = %err, "action failed; aborting run");
                self.terminate_background().await;
                return Err(err);
            }
        }

        self.finalize(plan.len()).await
    }

    async fn run_one(&mut self, index: usize, action: &Action) -> Result<()> {
        info!(index, title = %action.title, kind = action.kind.label(), "starting action");
        self.log.header(&action.title, action.command.as_deref());

        match &action.kind {
            ActionKind::RunCommand(command) => {
                let id = self.next_process_id();
                let handle = self.launcher.spawn_command(
                    id,
                    command,
                    OutputMode::Verbatim,
                    self.events_tx.clone(),
                )?;
                let code = self.wait_for_exit(handle).await;
                debug!(index, exit_code = ?code, "command closed");
                self.log.close_section();
            }
            ActionKind::StartWatchProcess(command) => {
                let id = self.next_process_id();
                let handle = self.launcher.spawn_command(
                    id,
                    command,
                    OutputMode::Verbatim,
                    self.events_tx.clone(),
                )?;
                self.background.push(handle);
            }
            ActionKind::StartLatencyMonitor => {
                let id = self.next_process_id();
                let handle = self.launcher.spawn_monitor(id, self.events_tx.clone())?;
                self.background.push(handle);
            }
            ActionKind::ModifyFile { path, content } => {
                mutator::overwrite(self.fs.as_ref(), path, content)?;
            }
            ActionKind::SystemInfo => {
                self.capture_system_info().await;
            }
        }

        self.settle(action.delay_or(self.options.default_delay)).await;
        Ok(())
    }

    async fn capture_system_info(&mut self) {
        let info = sysinfo::gather(self.fs.as_ref());
        self.log.append(OutputStream::Stdout, &info.report());

        let id = self.next_process_id();
        match self.launcher.spawn_command(
            id,
            &sysinfo::uptime_command(),
            OutputMode::Prefixed(UPTIME_PREFIX.to_string()),
            self.events_tx.clone(),
        ) {
            Ok(handle) => {
                self.wait_for_exit(handle).await;
            }
            Err(e) => {
                warn!(error = %e, "uptime query failed");
                self.log.append(OutputStream::Stdout, &format!("{UPTIME_PREFIX}unavailable\n"));
            }
        }
        self.log.close_section();
    }

    fn next_process_id(&mut self) -> ProcessId {
        self.next_id += 1;
        ProcessId(self.next_id)
    }

    /// Drain events until `handle`'s process closes. Returns its exit code.
    async fn wait_for_exit(&mut self, handle: ProcessHandle) -> Option<i32> {
        let id = handle.id();
        loop {
            let Some(event) = self.events_rx.recv().await else {
                // Unreachable while we hold `events_tx`.
                return None;
            };
            if let Some((exited, code)) = self.handle_event(event) {
                if exited == id {
                    return code;
                }
            }
        }
    }

    /// Drain events until `delay` has elapsed.
    async fn settle(&mut self, delay: Duration) {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => break,
                Some(event) = self.events_rx.recv() => {
                    self.handle_event(event);
                }
            }
        }
    }

    /// Apply one event to the log; returns exit notifications to the caller.
    fn handle_event(&mut self, event: ExecEvent) -> Option<(ProcessId, Option<i32>)> {
        match event {
            ExecEvent::Output { stream, chunk } => {
                self.log.append(stream, &chunk);
                None
            }
            ExecEvent::Exited { id, code } => {
                if self.background.iter().any(|h| h.id() == id) {
                    warn!(process = %id, exit_code = ?code, "background process exited before the plan finished");
                    self.log.close_section();
                }
                Some((id, code))
            }
        }
    }

    async fn terminate_background(&mut self) {
        for handle in self.background.drain(..) {
            if handle.is_finished() {
                debug!(process = %handle.id(), "background process already gone");
            } else {
                debug!(process = %handle.id(), "terminating background process");
            }
            handle.terminate().await;
        }
    }

    async fn finalize(mut self, actions: usize) -> Result<RunSummary> {
        self.terminate_background().await;

        while let Ok(event) = self.events_rx.try_recv() {
            if let ExecEvent::Output { stream, chunk } = event {
                self.log.append(stream, &chunk);
            }
        }

        let stderr_lines = self.log.stderr_lines();
        let log_path = self.options.log_path.clone();
        let bytes = self.log.flush_to(self.fs.as_ref(), &log_path)?;

        info!(actions, bytes, stderr_lines, log = ?log_path, "run finished");
        Ok(RunSummary {
            actions,
            log_path,
            bytes,
            stderr_lines,
        })
    }
}
