use std::collections::HashMap;
use std::time::Duration;

use bundlebench::config::settings::{
    DELAY_VAR, MODIFICATION_DELAY_VAR, MONITOR_INIT_DELAY_VAR, N_RUNS_VAR, WATCH_INIT_DELAY_VAR,
};
use bundlebench::config::Settings;
use bundlebench::errors::BenchError;

fn settings_from(vars: &[(&str, &str)]) -> Result<Settings, BenchError> {
    let env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Settings::from_lookup(|var| env.get(var).cloned())
}

#[test]
fn test_defaults_when_unset() {
    let settings = settings_from(&[]).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.runs, 3);
    assert_eq!(settings.delay, Duration::from_secs(1));
    assert_eq!(settings.watch_init_delay, Duration::from_secs(3));
    assert_eq!(settings.monitor_init_delay, Duration::from_secs(3));
    assert_eq!(settings.modification_delay, Duration::from_secs(3));
}

#[test]
fn test_empty_value_falls_back_to_default() {
    let settings = settings_from(&[(N_RUNS_VAR, ""), (DELAY_VAR, "  ")]).unwrap();
    assert_eq!(settings.runs, 3);
    assert_eq!(settings.delay, Duration::from_secs(1));
}

#[test]
fn test_overrides() {
    let settings = settings_from(&[
        (N_RUNS_VAR, "5"),
        (DELAY_VAR, "2"),
        (WATCH_INIT_DELAY_VAR, "10"),
        (MONITOR_INIT_DELAY_VAR, "4"),
        (MODIFICATION_DELAY_VAR, " 6 "),
    ])
    .unwrap();

    assert_eq!(settings.runs, 5);
    assert_eq!(settings.delay, Duration::from_secs(2));
    assert_eq!(settings.watch_init_delay, Duration::from_secs(10));
    assert_eq!(settings.monitor_init_delay, Duration::from_secs(4));
    assert_eq!(settings.modification_delay, Duration::from_secs(6));
}

#[test]
fn test_rejects_non_positive_and_garbage() {
    for bad in ["0", "-1", "abc", "1.5", "3s"] {
        let err = settings_from(&[(N_RUNS_VAR, bad)]).unwrap_err();
        match err {
            BenchError::InvalidSetting { var, value } => {
                assert_eq!(var, N_RUNS_VAR);
                assert_eq!(value, bad);
            }
            other => panic!("unexpected error for {bad:?}: {other}"),
        }
    }
}

#[test]
fn test_invalid_delay_names_the_variable() {
    let err = settings_from(&[(MODIFICATION_DELAY_VAR, "0")]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Expected environment variable AFTER_FILE_MODIFICATION_DELAY to contain integer positive value. Got: 0"
    );
}

#[test]
fn test_runs_overflow_is_rejected() {
    let err = settings_from(&[(N_RUNS_VAR, "99999999999")]).unwrap_err();
    assert!(matches!(err, BenchError::InvalidSetting { var: N_RUNS_VAR, .. }));
}
