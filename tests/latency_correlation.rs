use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bundlebench::fs::mock::MockFileSystem;
use bundlebench::watch::{
    LatencyCorrelator, LatencyMonitor, LatencyRecord, MonitorSettings, Observation,
    SubscriptionClient, SubscriptionState, TreeKind,
};

const ROOT: &str = "/proj";
const SUB: &str = "%1-1";

fn at(ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(1_700_000_000_000 + ms)
}

fn correlator() -> LatencyCorrelator {
    LatencyCorrelator::new(
        "/proj/src",
        vec![PathBuf::from("/proj/out/webpack"), PathBuf::from("/proj/out/parcel")],
        ".js",
    )
}

#[test]
fn test_latency_between_is_signed() {
    assert_eq!(LatencyRecord::between(at(100), at(350)).milliseconds, 250.0);
    assert_eq!(LatencyRecord::between(at(350), at(100)).milliseconds, -250.0);
}

#[test]
fn test_classify() {
    let c = correlator();
    assert_eq!(c.classify(Path::new("/proj/src/a.js")), Some(TreeKind::Source));
    assert_eq!(c.classify(Path::new("/proj/src/deep/b.js")), Some(TreeKind::Source));
    assert_eq!(c.classify(Path::new("/proj/out/parcel/main.js")), Some(TreeKind::Output));
    assert_eq!(c.classify(Path::new("/proj/src/a.js.mod")), None);
    assert_eq!(c.classify(Path::new("/proj/out/webpack/main.js.map")), None);
    assert_eq!(c.classify(Path::new("/proj/node_modules/x.js")), None);
    assert_eq!(c.classify(Path::new("/proj/out/fastpack/main.js")), None);
}

#[test]
fn test_output_before_any_source_is_informational() {
    let mut c = correlator();
    let obs = c.observe(Path::new("/proj/out/webpack/main.js"), at(10)).unwrap();

    assert!(matches!(obs, Observation::OutputModified { latency: None, .. }));
    assert_eq!(obs.report_lines(Path::new(ROOT)).len(), 1);
}

#[test]
fn test_output_measured_against_latest_source() {
    let mut c = correlator();
    let source = c.observe(Path::new("/proj/src/a.js"), at(1_000)).unwrap();
    assert_eq!(source.path(), Path::new("/proj/src/a.js"));
    assert_eq!(source.latency(), None);
    let first = c.observe(Path::new("/proj/out/webpack/main.js"), at(1_480)).unwrap();
    assert_eq!(first.latency().unwrap().milliseconds, 480.0);

    // A second source write replaces the reference point.
    c.observe(Path::new("/proj/src/b.js"), at(5_000)).unwrap();
    assert_eq!(c.last_source_modification(), Some(at(5_000)));
    let second = c.observe(Path::new("/proj/out/parcel/main.js"), at(5_120)).unwrap();
    assert_eq!(second.latency().unwrap().milliseconds, 120.0);

    let lines = second.report_lines(Path::new(ROOT));
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("out/parcel/main.js (mtime="), "{lines:?}");
    assert_eq!(lines[1], "\t120ms since source modification");
}

#[test]
fn test_unrelated_paths_do_not_move_the_reference() {
    let mut c = correlator();
    c.observe(Path::new("/proj/src/a.js"), at(100)).unwrap();
    assert!(c.observe(Path::new("/proj/src/style.css"), at(900)).is_none());
    assert_eq!(c.last_source_modification(), Some(at(100)));
}

fn monitor(fs: &MockFileSystem) -> LatencyMonitor {
    let settings = MonitorSettings::for_project(ROOT, "src", "out", "js");
    LatencyMonitor::new(&settings, SubscriptionClient::new(ROOT, SUB), Arc::new(fs.clone()))
}

#[test]
fn test_monitor_settings_for_project() {
    let settings = MonitorSettings::for_project("/proj", "src", "dist", ".ts").with_program("/usr/bin/watchman");
    assert_eq!(settings.program, "/usr/bin/watchman");
    assert_eq!(settings.source_dir, PathBuf::from("/proj/src"));
    assert_eq!(
        settings.output_dirs,
        vec![
            PathBuf::from("/proj/dist/fastpack"),
            PathBuf::from("/proj/dist/webpack"),
            PathBuf::from("/proj/dist/parcel"),
        ]
    );
    assert_eq!(settings.extension, "ts");
}

#[test]
fn test_monitor_reports_initialization_and_latency() {
    let fs = MockFileSystem::new();
    fs.add_file_modified_at("/proj/src/a.js", "a", at(2_000));
    fs.add_file_modified_at("/proj/out/webpack/main.js", "bundle", at(2_350));

    let mut monitor = monitor(&fs);

    assert_eq!(
        monitor.handle_line(r#"{"version":"4.9.0","subscribe":"%1-1"}"#).unwrap(),
        vec!["Initialization step 1.".to_string()]
    );
    assert_eq!(
        monitor
            .handle_line(r#"{"root":"/proj","subscription":"%1-1","files":["src/a.js"]}"#)
            .unwrap(),
        vec!["Initialization step 2. Fully initialized".to_string()]
    );
    assert_eq!(monitor.client().state(), SubscriptionState::Streaming);

    let source = monitor
        .handle_line(r#"{"root":"/proj","subscription":"%1-1","files":["src/a.js","src/a.js.mod"]}"#)
        .unwrap();
    assert_eq!(source.len(), 1);
    assert!(source[0].starts_with("src/a.js (mtime="));

    let output = monitor
        .handle_line(r#"{"root":"/proj","subscription":"%1-1","files":["out/webpack/main.js"]}"#)
        .unwrap();
    assert_eq!(output.len(), 2);
    assert_eq!(output[1], "\t350ms since source modification");
}

#[test]
fn test_monitor_skips_files_that_vanished() {
    let fs = MockFileSystem::new();
    let mut monitor = monitor(&fs);
    monitor.handle_line(r#"{"version":"4.9.0","subscribe":"%1-1"}"#).unwrap();
    monitor
        .handle_line(r#"{"root":"/proj","subscription":"%1-1","files":[]}"#)
        .unwrap();

    let report = monitor
        .handle_line(r#"{"root":"/proj","subscription":"%1-1","files":["src/gone.js"]}"#)
        .unwrap();
    assert!(report.is_empty());
    assert_eq!(monitor.correlator().last_source_modification(), None);
}

#[test]
fn test_monitor_propagates_protocol_errors() {
    let fs = MockFileSystem::new();
    let mut monitor = monitor(&fs);
    assert!(monitor.handle_line(r#"{"error":"boom"}"#).is_err());
}
