// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod plan;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_scripts, project_root_dir, Settings};
use crate::errors::Result;
use crate::exec::{ActionExecutor, ExecutorOptions, RealLauncher, RunSummary};
use crate::fs::{FileSystem, RealFileSystem};
use crate::plan::{discover_modifications, Plan, PlanBuilder};
use crate::types::{Target, Tool};
use crate::watch::MonitorSettings;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - tool selection and environment settings
/// - the project manifest (declared scripts)
/// - probe discovery and plan building
/// - the executor with the real launcher
pub async fn run(args: CliArgs) -> Result<Option<RunSummary>> {
    let tool: Tool = args.tool.parse()?;
    let settings = Settings::from_env()?;
    debug!(?settings, "settings loaded from environment");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let manifest_path = PathBuf::from(&args.project);
    let scripts = load_scripts(fs.as_ref(), &manifest_path)?;
    let root = project_root_dir(&manifest_path)?;
    // The subscription service reports canonical roots.
    let root = fs.canonicalize(&root).unwrap_or(root);

    let modifications = if scripts.is_declared(tool, Target::Watch) {
        discover_modifications(fs.as_ref(), &root.join(&args.src_dir))?
    } else {
        Vec::new()
    };
    info!(
        %tool,
        scripts = scripts.len(),
        modifications = modifications.len(),
        "building benchmark plan"
    );

    let plan = PlanBuilder::new(tool, &scripts, &settings)
        .runner(&args.runner)
        .project_root(&root)
        .build(&modifications);

    if args.dry_run {
        print_dry_run(tool, &plan, &settings);
        return Ok(None);
    }

    let monitor = MonitorSettings::for_project(&root, &args.src_dir, &args.out_dir, &args.extension)
        .with_program(&args.watchman);
    let launcher = RealLauncher::new(Arc::clone(&fs), monitor);
    let options = ExecutorOptions {
        default_delay: settings.delay,
        log_path: Path::new(&args.log_dir).join(format!("{tool}.log")),
        mirror_console: true,
    };

    let summary = ActionExecutor::new(plan, launcher, fs, options).run().await?;
    Ok(Some(summary))
}

/// Simple dry-run output: print every action with its command and delay.
pub fn print_dry_run(tool: Tool, plan: &Plan, settings: &Settings) {
    println!("bundlebench dry-run ({tool})");
    println!("  N_RUNS = {}", settings.runs);
    println!("  DELAY = {}s", settings.delay.as_secs());
    println!();

    println!("actions ({}):", plan.len());
    for (i, action) in plan.iter().enumerate() {
        println!("  {:>3}. [{}] {}", i + 1, action.kind.label(), action.title);
        if let Some(ref command) = action.command {
            println!("       command: {command}");
        }
        let delay = action.delay_or(settings.delay);
        println!("       delay: {}s", delay.as_secs());
    }

    debug!("dry-run complete (no execution)");
}
