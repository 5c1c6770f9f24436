#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bundlebench::exec::log_buffer::SEPARATOR;
use bundlebench::exec::{
    spawn_process, ActionExecutor, ExecEvent, ExecutorOptions, OutputMode, OutputStream, ProcessId,
    RealLauncher,
};
use bundlebench::fs::RealFileSystem;
use bundlebench::plan::{Action, ActionKind, CommandSpec, Plan};
use bundlebench::watch::{spawn_monitor, MonitorSettings};
use bundlebench_test_utils::{init_tracing, with_timeout};
use tempfile::TempDir;
use tokio::sync::mpsc;

fn sh(script: &str) -> CommandSpec {
    CommandSpec::new("sh", ["-c", script])
}

fn run_action(title: &str, script: &str) -> Action {
    Action::new(title, ActionKind::RunCommand(sh(script))).with_command(script)
}

#[tokio::test]
async fn test_real_commands_are_captured_and_nonzero_exit_advances() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let log_path = tmp.path().join("parcel.log");

    let plan = Plan::new(vec![
        run_action("first", "echo out; echo err 1>&2; exit 3"),
        run_action("second", "echo next"),
    ]);
    let launcher = RealLauncher::new(
        Arc::new(RealFileSystem),
        MonitorSettings::for_project(tmp.path(), "src", "out", "js"),
    );
    let options = ExecutorOptions {
        default_delay: Duration::ZERO,
        log_path: log_path.clone(),
        mirror_console: false,
    };

    let summary = with_timeout(ActionExecutor::new(plan, launcher, Arc::new(RealFileSystem), options).run())
        .await
        .unwrap();

    let log = std::fs::read_to_string(&log_path).unwrap();
    let first = log.find("ACTION: first\n").unwrap();
    let second = log.find("ACTION: second\n").unwrap();
    assert!(first < second);

    let first_section = &log[first..second];
    assert!(first_section.contains("COMMAND: echo out; echo err 1>&2; exit 3\n"));
    assert!(first_section.contains("\nout\n"));
    assert!(first_section.contains("STDERR: err\n"));
    assert!(log[second..].contains("next\n"));

    assert_eq!(summary.stderr_lines, 1);
    assert_eq!(summary.bytes, log.len());
}

#[tokio::test]
async fn test_spawn_failure_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let log_path = tmp.path().join("webpack.log");
    let plan = Plan::new(vec![Action::new(
        "missing",
        ActionKind::RunCommand(CommandSpec::new("/definitely/not/a/program", Vec::<String>::new())),
    )]);
    let launcher = RealLauncher::new(
        Arc::new(RealFileSystem),
        MonitorSettings::for_project(tmp.path(), "src", "out", "js"),
    );
    let options = ExecutorOptions {
        default_delay: Duration::ZERO,
        log_path: log_path.clone(),
        mirror_console: false,
    };

    let result = with_timeout(ActionExecutor::new(plan, launcher, Arc::new(RealFileSystem), options).run()).await;

    assert!(result.is_err());
    assert!(!log_path.exists());
}

#[tokio::test]
async fn test_prefixed_output_and_exit_event() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = spawn_process(
        ProcessId(7),
        &sh("printf 'up 3 days\\nload 0.1\\n'"),
        OutputMode::Prefixed("Uptime: ".to_string()),
        tx,
    )
    .unwrap();

    let mut stdout = String::new();
    let code = with_timeout(async {
        loop {
            match rx.recv().await {
                Some(ExecEvent::Output { stream: OutputStream::Stdout, chunk }) => stdout.push_str(&chunk),
                Some(ExecEvent::Output { .. }) => {}
                Some(ExecEvent::Exited { id, code }) => {
                    assert_eq!(id, ProcessId(7));
                    break code;
                }
                None => panic!("channel closed before exit"),
            }
        }
    })
    .await;

    assert_eq!(code, Some(0));
    assert_eq!(stdout, "Uptime: up 3 days\nUptime: load 0.1\n");

    with_timeout(async {
        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }
    })
    .await;
}

#[tokio::test]
async fn test_terminate_kills_long_running_process() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = spawn_process(ProcessId(1), &sh("echo started; exec sleep 30"), OutputMode::Verbatim, tx).unwrap();

    let first = with_timeout(rx.recv()).await;
    assert_eq!(
        first,
        Some(ExecEvent::Output {
            stream: OutputStream::Stdout,
            chunk: "started\n".to_string(),
        })
    );

    with_timeout(handle.terminate()).await;

    // No exit is reported for a terminated process.
    while let Ok(event) = rx.try_recv() {
        assert!(!matches!(event, ExecEvent::Exited { .. }));
    }
}

#[tokio::test]
async fn test_background_exit_closes_its_section() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let log_path = tmp.path().join("webpack.log");

    let plan = Plan::new(vec![Action::new(
        "yarn -s webpack:watch",
        ActionKind::StartWatchProcess(sh("echo watching; exit 1")),
    )
    .with_delay(Duration::from_secs(1))]);
    let launcher = RealLauncher::new(
        Arc::new(RealFileSystem),
        MonitorSettings::for_project(tmp.path(), "src", "out", "js"),
    );
    let options = ExecutorOptions {
        default_delay: Duration::ZERO,
        log_path: log_path.clone(),
        mirror_console: false,
    };

    with_timeout(ActionExecutor::new(plan, launcher, Arc::new(RealFileSystem), options).run())
        .await
        .unwrap();

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(log, format!("{SEPARATOR}ACTION: yarn -s webpack:watch\nwatching\n\n"));
}

/// Stand-in for the subscription service: answers the subscribe request read
/// from stdin with `lines` (`{id}` and `{root}` substituted), then idles.
fn fake_watchman(root: &Path, lines: &[&str]) -> PathBuf {
    let mut script = String::from(
        r#"#!/bin/sh
read request
id=$(printf '%s\n' "$request" | sed 's/.*"\(%[0-9]*-[0-9]*\)".*/\1/')
"#,
    );
    for line in lines {
        let line = line
            .replace("{root}", &root.to_string_lossy())
            .replace('"', "\\\"")
            .replace("{id}", "$id");
        script.push_str(&format!("echo \"{line}\"\n"));
    }
    script.push_str("exec sleep 30\n");

    let path = root.join("fake-watchman");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

async fn collect_monitor_output(settings: MonitorSettings, until: &str) -> String {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = spawn_monitor(ProcessId(1), &settings, Arc::new(RealFileSystem), tx).unwrap();

    let mut output = String::new();
    with_timeout(async {
        while !output.contains(until) {
            match rx.recv().await {
                Some(ExecEvent::Output { chunk, .. }) => output.push_str(&chunk),
                Some(ExecEvent::Exited { .. }) => panic!("the monitor never reports an exit"),
                None => break,
            }
        }
    })
    .await;

    with_timeout(handle.terminate()).await;
    output
}

#[tokio::test]
async fn test_monitor_reports_latency_from_subscription_service() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().canonicalize().unwrap();
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::create_dir_all(root.join("out/webpack")).unwrap();
    std::fs::write(root.join("src/a.js"), "a").unwrap();
    std::fs::write(root.join("out/webpack/main.js"), "bundle").unwrap();

    let program = fake_watchman(
        &root,
        &[
            r#"{"version":"2024.1","subscribe":"{id}"}"#,
            r#"{"root":"{root}","subscription":"{id}","files":[]}"#,
            r#"{"root":"{root}","subscription":"{id}","files":["src/a.js"]}"#,
            r#"{"root":"{root}","subscription":"{id}","files":["out/webpack/main.js"]}"#,
        ],
    );
    let settings = MonitorSettings::for_project(&root, "src", "out", "js")
        .with_program(program.to_string_lossy());

    let output = collect_monitor_output(settings, "ms since source modification\n").await;

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "CHECK MTIME: Initialization step 1.");
    assert_eq!(lines[1], "CHECK MTIME: Initialization step 2. Fully initialized");
    assert!(lines[2].starts_with("CHECK MTIME: src/a.js (mtime="), "{output}");
    assert!(lines[3].starts_with("CHECK MTIME: out/webpack/main.js (mtime="), "{output}");
    assert!(lines[4].starts_with("CHECK MTIME: \t"), "{output}");
    assert!(lines[4].ends_with("ms since source modification"), "{output}");
}

#[tokio::test]
async fn test_monitor_stops_on_foreign_subscription_id() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().canonicalize().unwrap();

    let program = fake_watchman(&root, &[r#"{"version":"2024.1","subscribe":"%0-0"}"#]);
    let settings = MonitorSettings::for_project(&root, "src", "out", "js")
        .with_program(program.to_string_lossy());

    let output = collect_monitor_output(settings, "\n").await;

    assert!(
        output.starts_with("CHECK MTIME: protocol error: Unexpected initial watchman response: "),
        "{output}"
    );
    assert!(!output.contains("Initialization step"));
}
