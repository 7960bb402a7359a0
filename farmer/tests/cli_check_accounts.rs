//! CLI tests for `farmer check-accounts` and `farmer init`.
//!
//! Spawns the farmer binary and verifies output and exit codes. None of these
//! commands touch the network.

use std::fs;
use std::process::Command;

use farmer::exit_codes;
use farmer::io::config::{FarmConfig, load_config};
use farmer::test_support::TEST_TOKEN;

#[test]
fn check_accounts_lists_names_without_tokens() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("tokens.txt");
    fs::write(
        &path,
        format!("# fleet\nalice:{TEST_TOKEN}\nbob:{TEST_TOKEN}:76561197960265738\n"),
    )
    .expect("write accounts");

    let output = Command::new(env!("CARGO_BIN_EXE_farmer"))
        .arg("check-accounts")
        .arg("--accounts")
        .arg(&path)
        .output()
        .expect("farmer check-accounts");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("alice\t-"));
    assert!(stdout.contains("bob\t10"));
    assert!(!stdout.contains(TEST_TOKEN));
}

#[test]
fn check_accounts_rejects_malformed_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("tokens.txt");
    fs::write(&path, format!("alice:{TEST_TOKEN}\nbob:nothex\n")).expect("write accounts");

    let output = Command::new(env!("CARGO_BIN_EXE_farmer"))
        .arg("check-accounts")
        .arg("--accounts")
        .arg(&path)
        .output()
        .expect("farmer check-accounts");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"));
}

#[test]
fn check_accounts_missing_file_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");

    let status = Command::new(env!("CARGO_BIN_EXE_farmer"))
        .current_dir(temp.path())
        .arg("check-accounts")
        .status()
        .expect("farmer check-accounts");

    assert_eq!(status.code(), Some(exit_codes::INVALID));
}

#[test]
fn init_writes_default_config() {
    let temp = tempfile::tempdir().expect("tempdir");

    let status = Command::new(env!("CARGO_BIN_EXE_farmer"))
        .current_dir(temp.path())
        .arg("init")
        .status()
        .expect("farmer init");

    assert_eq!(status.code(), Some(exit_codes::OK));
    let config = load_config(&temp.path().join("farmer.toml")).expect("load");
    assert_eq!(config, FarmConfig::default());
}

#[test]
fn run_with_invalid_config_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("farmer.toml"), "[timings]\nhold_secs = 0\n").expect("write");
    fs::write(
        temp.path().join("tokens.txt"),
        format!("alice:{TEST_TOKEN}\n"),
    )
    .expect("write accounts");

    let output = Command::new(env!("CARGO_BIN_EXE_farmer"))
        .current_dir(temp.path())
        .arg("run")
        .output()
        .expect("farmer run");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("hold_secs"));
}
