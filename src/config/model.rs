// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{Target, Tool};

/// The part of a project manifest the harness cares about.
///
/// Both layouts deserialize into this struct:
///
/// ```json
/// { "scripts": { "webpack:initial": "time webpack --config webpack.config.js" } }
/// ```
///
/// ```toml
/// [scripts]
/// "webpack:initial" = "time webpack --config webpack.config.js"
/// ```
///
/// Every other manifest key is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectManifest {
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

/// Declared scripts keyed by `<tool>:<target>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptTable {
    scripts: BTreeMap<String, String>,
}

impl ScriptTable {
    pub fn new(scripts: BTreeMap<String, String>) -> Self {
        Self { scripts }
    }

    /// Script text declared for `tool` / `target`, if any.
    pub fn script(&self, tool: Tool, target: Target) -> Option<&str> {
        self.scripts
            .get(&tool.script_key(target))
            .map(String::as_str)
    }

    pub fn is_declared(&self, tool: Tool, target: Target) -> bool {
        self.script(tool, target).is_some()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl From<ProjectManifest> for ScriptTable {
    fn from(manifest: ProjectManifest) -> Self {
        ScriptTable::new(manifest.scripts)
    }
}
