// src/plan/builder.rs

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{ScriptTable, Settings};
use crate::plan::{Action, ActionKind, CommandSpec, ModificationPair, Plan};
use crate::types::{Target, Tool};
use crate::watch::path_utils::display_relative;

pub const SYSTEM_INFO_TITLE: &str = "System Information";
pub const LATENCY_MONITOR_TITLE: &str = "file modification controlling service";
pub const DEFAULT_RUNNER: &str = "yarn";

/// Assembles the benchmark plan for one tool.
///
/// The plan is, in order:
/// 1. system information;
/// 2. `runs` repetitions of each declared timed script (`initial`, `cache`);
/// 3. when a watch script is declared and there is something to modify:
///    the watch build, the latency monitor, then one apply/revert pair of
///    file writes per modification.
///
/// Undeclared scripts are skipped silently.
#[derive(Debug, Clone)]
pub struct PlanBuilder<'a> {
    tool: Tool,
    scripts: &'a ScriptTable,
    settings: &'a Settings,
    runner: String,
    project_root: PathBuf,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(tool: Tool, scripts: &'a ScriptTable, settings: &'a Settings) -> Self {
        Self {
            tool,
            scripts,
            settings,
            runner: DEFAULT_RUNNER.to_string(),
            project_root: PathBuf::from("."),
        }
    }

    /// Program that runs declared scripts (`<runner> -s <script>`).
    pub fn runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = runner.into();
        self
    }

    /// Directory file paths in titles are shown relative to.
    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    pub fn build(&self, modifications: &[ModificationPair]) -> Plan {
        let mut actions = vec![Action::new(SYSTEM_INFO_TITLE, ActionKind::SystemInfo)];

        for target in Target::TIMED {
            let Some(script) = self.scripts.script(self.tool, target) else {
                debug!(tool = %self.tool, %target, "no script declared; skipping target");
                continue;
            };
            let (title, command) = self.script_command(target);
            for _ in 0..self.settings.runs {
                actions.push(
                    Action::new(title.clone(), ActionKind::RunCommand(command.clone()))
                        .with_command(script),
                );
            }
        }

        if let Some(watch_script) = self.scripts.script(self.tool, Target::Watch) {
            if modifications.is_empty() {
                info!(tool = %self.tool, "watch script declared but no probe files found; skipping watch phase");
            } else {
                self.push_watch_phase(&mut actions, watch_script, modifications);
            }
        }

        debug!(tool = %self.tool, actions = actions.len(), "plan built");
        Plan::new(actions)
    }

    fn push_watch_phase(
        &self,
        actions: &mut Vec<Action>,
        watch_script: &str,
        modifications: &[ModificationPair],
    ) {
        let (title, command) = self.script_command(Target::Watch);
        actions.push(
            Action::new(title, ActionKind::StartWatchProcess(command))
                .with_command(watch_script)
                .with_delay(self.settings.watch_init_delay),
        );
        actions.push(
            Action::new(LATENCY_MONITOR_TITLE, ActionKind::StartLatencyMonitor)
                .with_delay(self.settings.monitor_init_delay),
        );

        for pair in modifications {
            let original = self.relative(&pair.original_path);
            let probe = self.relative(&pair.probe_path);

            actions.push(
                Action::new(
                    format!("Modifying {original} using the content of {probe}"),
                    ActionKind::ModifyFile {
                        path: pair.original_path.clone(),
                        content: pair.probe_content.clone(),
                    },
                )
                .with_delay(self.settings.modification_delay),
            );
            actions.push(
                Action::new(
                    format!("Reverting {original} to the original content"),
                    ActionKind::ModifyFile {
                        path: pair.original_path.clone(),
                        content: pair.original_content.clone(),
                    },
                )
                .with_delay(self.settings.modification_delay),
            );
        }
    }

    fn script_command(&self, target: Target) -> (String, CommandSpec) {
        let script = self.tool.script_key(target);
        let command = CommandSpec::new(self.runner.clone(), ["-s".to_string(), script]);
        (command.to_string(), command)
    }

    fn relative(&self, path: &Path) -> String {
        display_relative(&self.project_root, path)
    }
}
