// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ProjectManifest, ScriptTable};
use crate::errors::{BenchError, Result};
use crate::fs::FileSystem;

/// Load the declared scripts from a project manifest.
///
/// `.toml` manifests are parsed with `toml`; everything else is treated as a
/// `package.json`-style JSON document. A manifest without a scripts section
/// declares nothing, which simply skips every phase.
pub fn load_scripts(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<ScriptTable> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path)?;

    let manifest: ProjectManifest = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&contents)?,
        _ => serde_json::from_str(&contents)?,
    };

    debug!(path = ?path, scripts = manifest.scripts.len(), "loaded project manifest");
    Ok(ScriptTable::from(manifest))
}

/// Figure out the project root from the manifest path.
///
/// - If the manifest path has a non-empty parent (e.g. "bench/package.json"),
///   we use that directory.
/// - If it's just a bare filename like "package.json" (parent = ""),
///   we fall back to the current working directory.
pub fn project_root_dir(manifest_path: &Path) -> Result<PathBuf> {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => std::env::current_dir().map_err(|e| {
            BenchError::Config(format!("cannot determine the current directory: {e}"))
        }),
    }
}
