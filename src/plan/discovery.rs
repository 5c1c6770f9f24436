// src/plan/discovery.rs

//! Probe file discovery.
//!
//! A probe is a file named like its original plus a `.mod` or `.mod<N>`
//! suffix (`foo.js.mod`, `foo.js.mod2`). During a watch benchmark the probe's
//! content is written over the original and then reverted, which makes the
//! watched build rebuild twice.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::fs::FileSystem;

/// Matches the extension of a probe file (without the leading dot).
static PROBE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^mod(\d*)$").expect("probe suffix regex is valid")
});

/// One probe file and the live file it temporarily replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModificationPair {
    pub original_path: PathBuf,
    /// Raw bytes; sources are not required to be UTF-8.
    pub original_content: Vec<u8>,
    pub probe_path: PathBuf,
    pub probe_content: Vec<u8>,
    /// Numeric suffix of the probe (`.mod` is 0). Orders probes that target
    /// the same original.
    pub sequence_index: u64,
}

/// Recursively collect modification pairs under `dir`, in plan order.
///
/// Probes without a regular original file next to them are dropped. A missing
/// `dir` yields no pairs.
pub fn discover_modifications(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<ModificationPair>> {
    if !fs.is_dir(dir) {
        warn!(dir = ?dir, "probe directory does not exist; no modifications discovered");
        return Ok(Vec::new());
    }

    let mut pairs = Vec::new();
    collect_pairs(fs, dir, &mut pairs)?;
    pairs.sort_by(compare_pairs);

    debug!(dir = ?dir, count = pairs.len(), "discovered modification pairs");
    Ok(pairs)
}

fn collect_pairs(
    fs: &dyn FileSystem,
    dir: &Path,
    pairs: &mut Vec<ModificationPair>,
) -> Result<()> {
    for entry in fs.read_dir(dir)? {
        if fs.is_dir(&entry) {
            collect_pairs(fs, &entry, pairs)?;
        } else if fs.is_file(&entry) {
            if let Some(pair) = pair_for_probe(fs, &entry)? {
                pairs.push(pair);
            }
        }
    }
    Ok(())
}

fn pair_for_probe(fs: &dyn FileSystem, probe: &Path) -> Result<Option<ModificationPair>> {
    let Some(sequence_index) = probe_sequence_index(probe) else {
        return Ok(None);
    };

    let original = probe.with_extension("");
    if !fs.is_file(&original) {
        debug!(probe = ?probe, "probe has no original file next to it; skipping");
        return Ok(None);
    }

    Ok(Some(ModificationPair {
        original_content: fs.read(&original)?,
        probe_content: fs.read(probe)?,
        original_path: original,
        probe_path: probe.to_path_buf(),
        sequence_index,
    }))
}

/// Sequence index of a probe file name, or `None` if `path` is not a probe.
///
/// `a.js.mod` → `Some(0)`, `a.js.mod3` → `Some(3)`, `a.js` → `None`.
pub fn probe_sequence_index(path: &Path) -> Option<u64> {
    let ext = path.extension()?.to_str()?;
    let caps = PROBE_SUFFIX.captures(ext)?;
    let digits = caps.get(1).map_or("", |m| m.as_str());

    if digits.is_empty() {
        return Some(0);
    }
    match digits.parse::<u64>() {
        Ok(index) => Some(index),
        Err(e) => {
            warn!(path = ?path, error = %e, "probe suffix out of range; ignoring file");
            None
        }
    }
}

/// Plan order of two modification pairs.
///
/// Pairs for the same original are ordered by sequence index (then probe
/// path, so `.mod` and `.mod0` still order deterministically). Pairs for
/// different originals are ordered by original path length first and only
/// then lexicographically: `src/z.js` runs before `src/app/a.js`.
pub fn compare_pairs(a: &ModificationPair, b: &ModificationPair) -> Ordering {
    if a.original_path == b.original_path {
        return a
            .sequence_index
            .cmp(&b.sequence_index)
            .then_with(|| a.probe_path.as_os_str().cmp(b.probe_path.as_os_str()));
    }

    let (a_path, b_path) = (a.original_path.as_os_str(), b.original_path.as_os_str());
    a_path.len().cmp(&b_path.len()).then_with(|| a_path.cmp(b_path))
}
