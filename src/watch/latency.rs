// src/watch/latency.rs

//! Correlates source writes with the output writes they cause.
//!
//! Only the most recent source write is remembered: every output write is
//! measured against it. Nothing here touches the filesystem; the monitor
//! looks up modification times and feeds them in.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, SecondsFormat};

use crate::watch::path_utils::display_relative;

/// Time between the last source write and one output write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyRecord {
    pub milliseconds: f64,
}

impl LatencyRecord {
    /// Signed difference `output - source`.
    pub fn between(source: SystemTime, output: SystemTime) -> Self {
        let milliseconds = match output.duration_since(source) {
            Ok(elapsed) => elapsed.as_nanos() as f64 / 1_000_000.0,
            Err(e) => -(e.duration().as_nanos() as f64 / 1_000_000.0),
        };
        Self { milliseconds }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    Source,
    Output,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// A source write; it becomes the new reference point.
    SourceModified { path: PathBuf, mtime: SystemTime },
    /// An output write. `latency` is `None` until a source write was seen.
    OutputModified {
        path: PathBuf,
        mtime: SystemTime,
        latency: Option<LatencyRecord>,
    },
}

impl Observation {
    pub fn path(&self) -> &Path {
        match self {
            Observation::SourceModified { path, .. } | Observation::OutputModified { path, .. } => path,
        }
    }

    pub fn latency(&self) -> Option<LatencyRecord> {
        match self {
            Observation::OutputModified { latency, .. } => *latency,
            Observation::SourceModified { .. } => None,
        }
    }

    /// Report lines for the benchmark log, without any prefix.
    ///
    /// The first line names the file and its mtime; a measured output write
    /// adds `\t<ms>ms since source modification`.
    pub fn report_lines(&self, root: &Path) -> Vec<String> {
        let (path, mtime) = match self {
            Observation::SourceModified { path, mtime }
            | Observation::OutputModified { path, mtime, .. } => (path, *mtime),
        };

        let stamp = DateTime::<Local>::from(mtime).to_rfc3339_opts(SecondsFormat::Millis, false);
        let mut lines = vec![format!("{} (mtime={})", display_relative(root, path), stamp)];
        if let Some(latency) = self.latency() {
            lines.push(format!(
                "\t{}ms since source modification",
                latency.milliseconds.round() as i64
            ));
        }
        lines
    }
}

#[derive(Debug, Clone)]
pub struct LatencyCorrelator {
    source_dir: PathBuf,
    output_dirs: Vec<PathBuf>,
    extension: String,
    last_source_modification: Option<SystemTime>,
}

impl LatencyCorrelator {
    /// `extension` may be given with or without the leading dot.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        output_dirs: Vec<PathBuf>,
        extension: impl AsRef<str>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dirs,
            extension: extension.as_ref().trim_start_matches('.').to_string(),
            last_source_modification: None,
        }
    }

    pub fn last_source_modification(&self) -> Option<SystemTime> {
        self.last_source_modification
    }

    /// Which watched tree `path` belongs to, if it has the watched extension.
    pub fn classify(&self, path: &Path) -> Option<TreeKind> {
        if path.extension() != Some(OsStr::new(&self.extension)) {
            return None;
        }
        if path.starts_with(&self.source_dir) {
            Some(TreeKind::Source)
        } else if self.output_dirs.iter().any(|dir| path.starts_with(dir)) {
            Some(TreeKind::Output)
        } else {
            None
        }
    }

    /// Record a write to `path` at `mtime`. Returns `None` for paths outside
    /// both trees or without the watched extension.
    pub fn observe(&mut self, path: &Path, mtime: SystemTime) -> Option<Observation> {
        match self.classify(path)? {
            TreeKind::Source => {
                self.last_source_modification = Some(mtime);
                Some(Observation::SourceModified {
                    path: path.to_path_buf(),
                    mtime,
                })
            }
            TreeKind::Output => Some(Observation::OutputModified {
                path: path.to_path_buf(),
                mtime,
                latency: self
                    .last_source_modification
                    .map(|source| LatencyRecord::between(source, mtime)),
            }),
        }
    }
}
