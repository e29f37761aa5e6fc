//! Integration tests for `phonelab config` and `phonelab walk`.
//!
//! Tests config loading with real TOML files and a walk over a temporary tree.

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use phonelab_cli::commands::{load_walk_config, walk};
use phonelab_cli::error::CliError;
use phonelab_logfile::{DirectoryWalker, WalkConfigBuilder};

#[test]
#[serial]
fn test_config_load_valid_toml() {
    // Given: A valid config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("phonelab.toml");
    fs::write(
        &config_path,
        r#"
excluded_dir_names = ["tag", "scratch"]
max_concurrent_tasks = 4
queue_capacity = 32
sort_records = false
"#,
    )
    .expect("should write config");

    // When: Loading the config
    let config = load_walk_config(Some(config_path.as_path())).expect("valid config should load");

    // Then: File values win over defaults
    assert_eq!(config.max_concurrent_tasks, 4);
    assert_eq!(config.queue_capacity, 32);
    assert!(!config.sort_records);
    assert_eq!(config.excluded_dir_names, vec!["tag", "scratch"]);
}

#[test]
#[serial]
fn test_config_load_empty_file_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("empty.toml");
    fs::write(&config_path, "").expect("should write empty file");

    let config = load_walk_config(Some(config_path.as_path())).expect("empty config should use defaults");
    assert_eq!(config.excluded_dir_names, vec!["tag"]);
    assert!(config.sort_records);
}

#[test]
#[serial]
fn test_config_load_malformed_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "max_concurrent_tasks = [\n").expect("should write bad config");

    let err = load_walk_config(Some(config_path.as_path())).expect_err("malformed TOML should fail");
    assert!(matches!(err, CliError::Config(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
#[serial]
fn test_config_load_out_of_range_value() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("phonelab.toml");
    fs::write(&config_path, "max_concurrent_tasks = 0\n").expect("should write config");

    let err = load_walk_config(Some(config_path.as_path())).expect_err("zero workers should fail");
    assert!(err.to_string().contains("max_concurrent_tasks"));
}

#[test]
#[serial]
fn test_config_load_missing_file() {
    let err = load_walk_config(Some(Path::new("/nonexistent/phonelab.toml")))
        .expect_err("missing file should fail to load");
    assert_eq!(err.exit_code(), 10);
}

#[test]
#[serial]
fn test_config_env_override() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("phonelab.toml");
    fs::write(&config_path, "max_concurrent_tasks = 4\n").expect("should write config");

    // SAFETY: serialised with every other env-reading test in this file.
    unsafe {
        std::env::set_var("PHONELAB_WALK_MAX_CONCURRENT_TASKS", "2");
    }
    let result = load_walk_config(Some(config_path.as_path()));
    unsafe {
        std::env::remove_var("PHONELAB_WALK_MAX_CONCURRENT_TASKS");
    }

    let config = result.expect("config should load");
    assert_eq!(config.max_concurrent_tasks, 2, "env should override file");
}

#[test]
#[serial]
fn test_config_invalid_env_value_is_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("phonelab.toml");
    fs::write(&config_path, "max_concurrent_tasks = 4\n").expect("should write config");

    // SAFETY: serialised with every other env-reading test in this file.
    unsafe {
        std::env::set_var("PHONELAB_WALK_FOLLOW_LINKS", "not-a-bool");
    }
    let with_file = load_walk_config(Some(config_path.as_path()));
    let without_file = load_walk_config(None);
    unsafe {
        std::env::remove_var("PHONELAB_WALK_FOLLOW_LINKS");
    }

    for result in [with_file, without_file] {
        let err = result.expect_err("invalid env value should fail");
        assert!(matches!(err, CliError::Config(_)), "got {err:?}");
        assert_eq!(err.exit_code(), 2);
    }
}

#[test]
#[serial]
fn test_config_without_file_uses_defaults() {
    let config = load_walk_config(None).expect("defaults should be valid");
    assert!(config.max_concurrent_tasks >= 1);
}

#[tokio::test]
async fn test_walk_reports_partial_failures() {
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../crates/logfile/tests/fixtures");
    let temp_dir = TempDir::new().expect("should create temp dir");
    let good = temp_dir.path().join("dev/time/2015/03/01");
    let mixed = temp_dir.path().join("dev/time/2015/03/02");
    let tagged = temp_dir.path().join("dev/tag/time/2015/03/03");
    for dir in [&good, &mixed, &tagged] {
        fs::create_dir_all(dir).expect("should create dir");
    }
    fs::copy(fixtures.join("20-1000.out"), good.join("20-1000.out")).expect("copy");
    fs::copy(fixtures.join("unsorted.out"), mixed.join("unsorted.out")).expect("copy");
    fs::write(mixed.join("broken.out"), "garbage\n").expect("write");
    fs::copy(fixtures.join("20-1000.out"), tagged.join("20-1000.out")).expect("copy");

    let config = WalkConfigBuilder::new()
        .max_concurrent_tasks(2)
        .build()
        .expect("valid config");
    let walker = DirectoryWalker::new(config).expect("walker");

    let report = walk::run(&walker, temp_dir.path()).await.expect("walk should succeed");
    assert_eq!(report.dispatched, 2, "tag subtree must be skipped");
    assert_eq!(report.total_files, 3);
    assert_eq!(report.failed_files, 1);
    assert_eq!(report.total_records, 1011);
    assert!(report.failed_directories.is_empty());
    assert!(report.directories[0].dir.ends_with("2015/03/01"));
}
