#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use bundlebench::config::{ScriptTable, Settings};
use bundlebench::plan::ModificationPair;
use bundlebench::types::{Target, Tool};

/// Builder for `ScriptTable` to simplify test setup.
pub struct ScriptTableBuilder {
    scripts: BTreeMap<String, String>,
}

impl ScriptTableBuilder {
    pub fn new() -> Self {
        Self {
            scripts: BTreeMap::new(),
        }
    }

    pub fn with_script(mut self, tool: Tool, target: Target, script: &str) -> Self {
        self.scripts.insert(tool.script_key(target), script.to_string());
        self
    }

    /// Declare a script under an arbitrary key (e.g. unrelated package scripts).
    pub fn with_raw(mut self, key: &str, script: &str) -> Self {
        self.scripts.insert(key.to_string(), script.to_string());
        self
    }

    pub fn build(self) -> ScriptTable {
        ScriptTable::new(self.scripts)
    }
}

impl Default for ScriptTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings with `runs` repetitions and no delays at all.
pub fn instant_settings(runs: u32) -> Settings {
    Settings {
        runs,
        delay: Duration::ZERO,
        watch_init_delay: Duration::ZERO,
        monitor_init_delay: Duration::ZERO,
        modification_delay: Duration::ZERO,
    }
}

/// A modification pair with literal contents.
pub fn pair(original: &str, index: u64) -> ModificationPair {
    let probe = if index == 0 {
        format!("{original}.mod")
    } else {
        format!("{original}.mod{index}")
    };
    ModificationPair {
        original_path: PathBuf::from(original),
        original_content: format!("original {original}").into_bytes(),
        probe_path: PathBuf::from(&probe),
        probe_content: format!("probe {probe}").into_bytes(),
        sequence_index: index,
    }
}
