use std::path::{Path, PathBuf};

use bundlebench::config::{load_scripts, project_root_dir};
use bundlebench::errors::BenchError;
use bundlebench::fs::mock::MockFileSystem;
use bundlebench::types::{Target, Tool};

#[test]
fn test_load_package_json_scripts() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/bench/package.json",
        r#"{
            "name": "bench",
            "dependencies": { "webpack": "^4.0.0" },
            "scripts": {
                "webpack:initial": "time webpack",
                "webpack:watch": "webpack --watch",
                "fastpack:cache": "time fpack build"
            }
        }"#,
    );

    let scripts = load_scripts(&fs, "/bench/package.json").unwrap();

    assert_eq!(scripts.len(), 3);
    assert_eq!(scripts.script(Tool::Webpack, Target::Initial), Some("time webpack"));
    assert!(scripts.is_declared(Tool::Webpack, Target::Watch));
    assert!(!scripts.is_declared(Tool::Webpack, Target::Cache));
    assert_eq!(scripts.script(Tool::Fastpack, Target::Cache), Some("time fpack build"));
    assert_eq!(scripts.script(Tool::Parcel, Target::Initial), None);
}

#[test]
fn test_load_toml_manifest() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/bench/bench.toml",
        r#"
[scripts]
"parcel:initial" = "time parcel build src/index.js"
"parcel:cache" = "time parcel build --cache src/index.js"
"#,
    );

    let scripts = load_scripts(&fs, "/bench/bench.toml").unwrap();

    assert_eq!(scripts.len(), 2);
    assert_eq!(
        scripts.script(Tool::Parcel, Target::Cache),
        Some("time parcel build --cache src/index.js")
    );
}

#[test]
fn test_manifest_without_scripts_declares_nothing() {
    let fs = MockFileSystem::new();
    fs.add_file("/bench/package.json", r#"{ "name": "bench" }"#);

    let scripts = load_scripts(&fs, "/bench/package.json").unwrap();
    assert!(scripts.is_empty());
}

#[test]
fn test_malformed_manifest_is_a_json_error() {
    let fs = MockFileSystem::new();
    fs.add_file("/bench/package.json", "{ not json");

    let err = load_scripts(&fs, "/bench/package.json").unwrap_err();
    assert!(matches!(err, BenchError::Json(_)));
}

#[test]
fn test_missing_manifest_is_an_error() {
    let fs = MockFileSystem::new();
    assert!(load_scripts(&fs, "/bench/package.json").is_err());
}

#[test]
fn test_project_root_dir() {
    assert_eq!(
        project_root_dir(Path::new("bench/package.json")).unwrap(),
        PathBuf::from("bench")
    );
    assert_eq!(
        project_root_dir(Path::new("package.json")).unwrap(),
        std::env::current_dir().unwrap()
    );
}
