// src/exec/process.rs

//! Spawning one external process and streaming its output.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::exec::log_buffer::{prefix_lines, STDERR_PREFIX};
use crate::exec::{EventSender, ExecEvent, OutputStream, ProcessHandle, ProcessId};
use crate::plan::CommandSpec;

/// How stdout of a process is written to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Bytes as produced, line by line.
    Verbatim,
    /// Every line prefixed, e.g. `Uptime: `.
    Prefixed(String),
}

/// Spawn `command` and stream its output as [`ExecEvent::Output`].
///
/// - stdout is forwarded according to `mode`;
/// - every stderr line is forwarded as `STDERR: <line>`;
/// - once the process has exited *and* both streams are closed, a single
///   [`ExecEvent::Exited`] is sent. The exit code is reported, never judged.
///
/// Terminating the returned handle kills the process and sends no `Exited`.
pub fn spawn_process(
    id: ProcessId,
    command: &CommandSpec,
    mode: OutputMode,
    events: EventSender,
) -> Result<ProcessHandle> {
    info!(process = %id, cmd = %command, "starting process");

    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("spawning process '{command}'"))?;

    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(forward_output(
            BufReader::new(stdout),
            OutputStream::Stdout,
            mode,
            events.clone(),
        )));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(forward_output(
            BufReader::new(stderr),
            OutputStream::Stderr,
            OutputMode::Prefixed(STDERR_PREFIX.to_string()),
            events.clone(),
        )));
    }

    let (cancel_tx, cancel_rx) = oneshot::channel();
    let task = tokio::spawn(supervise(id, child, readers, events, cancel_rx));

    Ok(ProcessHandle::new(id, cancel_tx, task))
}

async fn supervise(
    id: ProcessId,
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    events: EventSender,
    cancel_rx: oneshot::Receiver<()>,
) {
    tokio::select! {
        status = child.wait() => {
            let code = match status {
                Ok(status) => {
                    info!(process = %id, exit_code = ?status.code(), success = status.success(), "process exited");
                    status.code()
                }
                Err(e) => {
                    warn!(process = %id, error = %e, "failed to wait for process");
                    None
                }
            };

            // All output must reach the log before the exit does.
            for reader in readers {
                if let Err(e) = reader.await {
                    debug!(process = %id, error = %e, "output reader ended abnormally");
                }
            }
            let _ = events.send(ExecEvent::Exited { id, code });
        }

        cancel = cancel_rx => {
            if cancel.is_err() {
                debug!(process = %id, "process handle dropped; killing process");
            } else {
                info!(process = %id, "termination requested; killing process");
            }
            if let Err(e) = child.kill().await {
                warn!(process = %id, error = %e, "failed to kill process");
            }
            // Grandchildren may still hold the pipes open.
            for reader in readers {
                reader.abort();
            }
        }
    }
}

async fn forward_output<R>(mut reader: R, stream: OutputStream, mode: OutputMode, events: EventSender)
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let chunk = match &mode {
                    OutputMode::Verbatim => text.into_owned(),
                    OutputMode::Prefixed(prefix) => prefix_lines(prefix, &text),
                };
                if events.send(ExecEvent::Output { stream, chunk }).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(?stream, error = %e, "output read failed");
                break;
            }
        }
    }
}
