//! Smoke tests against the built binary. None of these need a browser.

use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;
use watch_core::{RunLock, StorageConfig};

/// Endpoint on a local port nothing listens on: bound, then released.
fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind ephemeral port");
    let port = listener.local_addr().expect("Failed to read local address").port();
    format!("http://127.0.0.1:{}", port)
}

fn run_watch(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_parking-watch"))
        .env("PARKING_WATCH_HOME", home)
        .env("PARKING_WATCH_WEBDRIVER_URL", closed_endpoint())
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to spawn parking-watch")
}

fn run_log(home: &Path) -> String {
    std::fs::read_to_string(home.join("watch.log")).unwrap_or_default()
}

#[test]
fn test_invalid_date_exits_2() {
    let home = TempDir::new().unwrap();

    let output = run_watch(home.path(), &["--target-date", "2026-2-28"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("[ERROR] invalid --target-date"));
    assert!(run_log(home.path()).contains("[ERROR] invalid --target-date (expected YYYY-MM-DD): 2026-2-28"));
    assert!(!home.path().join("watch.lock").exists());
}

#[test]
fn test_missing_target_date_is_usage_error() {
    let home = TempDir::new().unwrap();

    let output = run_watch(home.path(), &[]);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unknown_location_is_usage_error() {
    let home = TempDir::new().unwrap();

    let output = run_watch(home.path(), &["--target-date", "2026-02-28", "--location", "kirkwood"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(run_log(home.path()).is_empty());
}

#[test]
fn test_overlapping_run_is_skipped() {
    let home = TempDir::new().unwrap();
    let storage = StorageConfig::with_root(home.path().to_path_buf());
    let _held = RunLock::acquire(&storage.lock_file()).unwrap().unwrap();

    let output = run_watch(home.path(), &["--target-date", "2026-02-28", "--location", "palisades"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("[SKIP]"));
    let log = run_log(home.path());
    assert!(log.contains("[SKIP] overlapping run (--target-date 2026-02-28 --location PALISADES)"));
    assert_eq!(log.lines().count(), 1);
}

#[test]
fn test_unreachable_driver_fails_without_retry() {
    let home = TempDir::new().unwrap();

    let output = run_watch(home.path(), &["--target-date", "2026-02-28"]);

    assert_eq!(output.status.code(), Some(1));
    let log = run_log(home.path());
    assert!(log.contains("[ERROR] detection: automation client unavailable"));
    assert!(!log.contains("attempts"));
    assert!(!home.path().join("state.json").exists());
}
