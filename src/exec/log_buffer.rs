// src/exec/log_buffer.rs

//! The benchmark capture and its text format.
//!
//! The log is what the reporting stage parses later, so the markers here are
//! fixed: sections start with [`SEPARATOR`] and an `ACTION:` line, timings
//! come from `STDERR: real ...` lines and latency from `CHECK MTIME:` lines.

use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::OutputStream;
use crate::fs::FileSystem;

pub const SEPARATOR: &str = "\n---------------------------------------------------------\n";
pub const STDERR_PREFIX: &str = "STDERR: ";
pub const MONITOR_PREFIX: &str = "CHECK MTIME: ";
pub const ACTION_PREFIX: &str = "ACTION: ";
pub const COMMAND_PREFIX: &str = "COMMAND: ";

/// Prefix every line of `text`, terminating each with `\n`.
pub fn prefix_lines(prefix: &str, text: &str) -> String {
    let mut out = String::with_capacity(text.len() + prefix.len());
    for line in text.lines() {
        out.push_str(prefix);
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Append-only capture of everything the run printed.
///
/// Every chunk is optionally mirrored to stdout as it arrives.
#[derive(Debug, Default)]
pub struct LogBuffer {
    chunks: Vec<String>,
    stderr_lines: usize,
    mirror_console: bool,
}

impl LogBuffer {
    pub fn new(mirror_console: bool) -> Self {
        Self {
            chunks: Vec::new(),
            stderr_lines: 0,
            mirror_console,
        }
    }

    pub fn append(&mut self, stream: OutputStream, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        if stream == OutputStream::Stderr {
            self.stderr_lines += chunk.lines().count();
        }
        if self.mirror_console {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(chunk.as_bytes());
            let _ = stdout.flush();
        }
        self.chunks.push(chunk.to_string());
    }

    /// Start a section for one action.
    pub fn header(&mut self, title: &str, command: Option<&str>) {
        let mut header = format!("{SEPARATOR}{ACTION_PREFIX}{title}\n");
        if let Some(command) = command {
            header.push_str(&format!("{COMMAND_PREFIX}{command}\n"));
        }
        self.append(OutputStream::Stdout, &header);
    }

    /// Close the output of a process that has finished.
    pub fn close_section(&mut self) {
        self.append(OutputStream::Stdout, "\n");
    }

    /// Number of stderr lines captured so far.
    pub fn stderr_lines(&self) -> usize {
        self.stderr_lines
    }

    pub fn text(&self) -> String {
        self.chunks.concat()
    }

    /// Write the whole capture to `path`, consuming the buffer.
    ///
    /// Returns the number of bytes written.
    pub fn flush_to(self, fs: &dyn FileSystem, path: &Path) -> Result<usize> {
        let text = self.text();
        debug!(path = ?path, chunks = self.chunks.len(), "flushing log buffer");
        fs.write(path, text.as_bytes())?;
        info!(path = ?path, bytes = text.len(), "benchmark log written");
        Ok(text.len())
    }
}
