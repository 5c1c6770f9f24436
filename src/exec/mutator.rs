// src/exec/mutator.rs

use std::path::Path;

use tracing::info;

use crate::errors::Result;
use crate::fs::FileSystem;

/// Overwrite `path` with `content`, byte for byte.
///
/// No backup is taken: the plan schedules the revert with the content read
/// at discovery time. The file is truncated in place so watchers see a
/// modification of the same file rather than a replacement.
pub fn overwrite(fs: &dyn FileSystem, path: &Path, content: &[u8]) -> Result<()> {
    fs.write(path, content)?;
    info!(path = ?path, bytes = content.len(), "file overwritten");
    Ok(())
}
