// src/watch/monitor.rs

//! The latency monitor: a change-subscription subprocess whose notifications
//! are turned into `CHECK MTIME:` log lines.
//!
//! [`LatencyMonitor`] is the synchronous part (protocol state machine plus
//! correlator); [`spawn_monitor`] wires it to the subprocess.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::exec::log_buffer::{prefix_lines, MONITOR_PREFIX};
use crate::exec::{EventSender, ExecEvent, OutputStream, ProcessHandle, ProcessId};
use crate::fs::FileSystem;
use crate::types::Tool;
use crate::watch::latency::LatencyCorrelator;
use crate::watch::protocol::{ProtocolError, ProtocolEvent, SubscriptionClient};

pub const DEFAULT_WATCHMAN: &str = "watchman";
pub const WATCHMAN_ARGS: [&str; 4] = ["--no-save-state", "-j", "--no-pretty", "-p"];

/// Where and what the latency monitor watches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Subscription service binary.
    pub program: String,
    /// Subscribed directory; must be the canonical path the service reports.
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub output_dirs: Vec<PathBuf>,
    /// Without the leading dot.
    pub extension: String,
}

impl MonitorSettings {
    /// Settings for a project `root` with source tree `root/<src>` and one
    /// output tree `root/<out>/<tool>` per known tool.
    pub fn for_project(root: impl Into<PathBuf>, src: &str, out: &str, extension: &str) -> Self {
        let root = root.into();
        Self {
            program: DEFAULT_WATCHMAN.to_string(),
            source_dir: root.join(src),
            output_dirs: Tool::ALL.iter().map(|tool| root.join(out).join(tool.as_str())).collect(),
            extension: extension.trim_start_matches('.').to_string(),
            root,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

/// Protocol handling and latency correlation for one subscription.
#[derive(Debug)]
pub struct LatencyMonitor {
    client: SubscriptionClient,
    correlator: LatencyCorrelator,
    fs: Arc<dyn FileSystem>,
}

impl LatencyMonitor {
    pub fn new(settings: &MonitorSettings, client: SubscriptionClient, fs: Arc<dyn FileSystem>) -> Self {
        let correlator = LatencyCorrelator::new(
            settings.source_dir.clone(),
            settings.output_dirs.clone(),
            &settings.extension,
        );
        Self {
            client,
            correlator,
            fs,
        }
    }

    pub fn client(&self) -> &SubscriptionClient {
        &self.client
    }

    pub fn correlator(&self) -> &LatencyCorrelator {
        &self.correlator
    }

    /// Handle one protocol line, returning the report lines it produced
    /// (unprefixed). An error means the subscription is unusable.
    pub fn handle_line(&mut self, line: &str) -> std::result::Result<Vec<String>, ProtocolError> {
        match self.client.handle_line(line)? {
            ProtocolEvent::Acknowledged { .. } => Ok(vec!["Initialization step 1.".to_string()]),
            ProtocolEvent::Initialized { .. } => {
                Ok(vec!["Initialization step 2. Fully initialized".to_string()])
            }
            ProtocolEvent::Ignored => Ok(Vec::new()),
            ProtocolEvent::Changes(batch) => {
                let mut report = Vec::new();
                for path in &batch.changed_paths {
                    if self.correlator.classify(path).is_none() {
                        continue;
                    }
                    let mtime = match self.fs.modified(path) {
                        Ok(mtime) => mtime,
                        Err(e) => {
                            warn!(path = ?path, error = %e, "changed file vanished before stat; skipping");
                            continue;
                        }
                    };
                    if let Some(observation) = self.correlator.observe(path, mtime) {
                        if let Some(latency) = observation.latency() {
                            info!(path = ?observation.path(), ms = latency.milliseconds, "output written after source modification");
                        }
                        report.extend(observation.report_lines(self.client.root()));
                    }
                }
                Ok(report)
            }
        }
    }
}

/// Start the subscription subprocess and feed its output through a
/// [`LatencyMonitor`]. Report lines are sent as `CHECK MTIME: ` output.
///
/// The monitor never exits on its own unless the protocol is violated or the
/// service goes away; terminating the handle kills the subprocess.
pub fn spawn_monitor(
    id: ProcessId,
    settings: &MonitorSettings,
    fs: Arc<dyn FileSystem>,
    events: EventSender,
) -> Result<ProcessHandle> {
    let client = SubscriptionClient::with_generated_id(settings.root.clone());
    info!(
        process = %id,
        root = ?settings.root,
        subscription = %client.subscription(),
        "starting latency monitor"
    );

    let mut child = Command::new(&settings.program)
        .args(WATCHMAN_ARGS)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("spawning change-subscription service '{}'", settings.program))?;

    let mut stdin = child.stdin.take().context("subscription service has no stdin")?;
    let stdout = child.stdout.take().context("subscription service has no stdout")?;

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(process = %id, "subscription service stderr: {}", line);
            }
        });
    }

    let request = format!("{}\n", client.subscribe_request());
    let mut monitor = LatencyMonitor::new(settings, client, fs);
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = stdin.write_all(request.as_bytes()).await {
            error!(process = %id, error = %e, "failed to send subscribe request");
            return;
        }
        if let Err(e) = stdin.flush().await {
            warn!(process = %id, error = %e, "failed to flush subscribe request");
        }

        let mut lines = BufReader::new(stdout).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => {
                            info!(process = %id, "subscription stream closed");
                            break;
                        }
                        Err(e) => {
                            warn!(process = %id, error = %e, "failed to read subscription stream");
                            break;
                        }
                    };

                    match monitor.handle_line(&line) {
                        Ok(report) => emit(&events, &report),
                        Err(e) => {
                            error!(process = %id, error = %e, "subscription protocol violated; stopping monitor");
                            emit(&events, &[format!("protocol error: {e}")]);
                            break;
                        }
                    }
                }

                _ = &mut cancel_rx => {
                    info!(process = %id, "latency monitor terminated");
                    break;
                }
            }
        }

        // Keeps stdin open until here; the service ends its session on EOF.
        drop(stdin);
        if let Err(e) = child.kill().await {
            debug!(process = %id, error = %e, "subscription service already gone");
        }
    });

    Ok(ProcessHandle::new(id, cancel_tx, task))
}

fn emit(events: &EventSender, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let chunk = prefix_lines(MONITOR_PREFIX, &lines.join("\n"));
    let _ = events.send(ExecEvent::Output {
        stream: OutputStream::Stdout,
        chunk,
    });
}
