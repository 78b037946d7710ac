//! CLI integration tests for the ispend binary.
//!
//! These cover argument parsing and `check-config`; none of them start the
//! server.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the ispend binary with a clean config environment.
fn ispend() -> Command {
    let mut cmd = Command::cargo_bin("ispend").unwrap();
    cmd.env_remove("ISPEND_CONFIG").env_remove("ISPEND_LOG_DIR");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    ispend()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("check-config"));
}

#[test]
fn test_version_displays() {
    ispend()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ispend"));
}

#[test]
fn test_serve_help_shows_overrides() {
    ispend()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--bind"));
}

#[test]
fn test_invalid_port_rejected() {
    ispend()
        .args(["serve", "--port", "not-a-port"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

// ─────────────────────────────────────────────────────────────────────────────
// check-config
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_check_config_prints_effective_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ispend.yaml");
    std::fs::write(&path, "server:\n  port: 9123\n").unwrap();

    ispend()
        .arg("--config")
        .arg(&path)
        .arg("check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("port = 9123"))
        .stdout(predicate::str::contains("Loaded from"));
}

#[test]
fn test_check_config_rejects_sqlite_without_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ispend.yaml");
    std::fs::write(&path, "store:\n  kind: sqlite\n").unwrap();

    ispend()
        .arg("--config")
        .arg(&path)
        .arg("check-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("store.path"));
}

#[test]
fn test_check_config_missing_file() {
    ispend()
        .args(["--config", "/nonexistent/ispend.yaml", "check-config", "--quiet"])
        .assert()
        .failure();
}
