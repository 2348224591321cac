//! Integration tests for CLI argument handling
//!
//! Runs the binary with argument combinations that never reach the network
//! and checks exit behavior and help output.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_coinpulse"))
        .args(args)
        .output()
        .expect("Failed to execute coinpulse")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("coinpulse"), "Help should mention coinpulse");
    assert!(stdout.contains("news"), "Help should list the news command");
    assert!(
        stdout.contains("markets"),
        "Help should list the markets command"
    );
    assert!(stdout.contains("cache"), "Help should list the cache command");
}

#[test]
fn test_version_flag_exits_successfully() {
    let output = run_cli(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("coinpulse"));
}

#[test]
fn test_no_subcommand_prints_usage_and_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success(), "Expected bare invocation to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Usage") || stderr.contains("usage"),
        "Should print usage: {}",
        stderr
    );
}

#[test]
fn test_unknown_subcommand_fails() {
    let output = run_cli(&["frobnicate"]);
    assert!(
        !output.status.success(),
        "Expected unknown subcommand to fail"
    );
}

#[test]
fn test_news_help_documents_refresh_flag() {
    let output = run_cli(&["news", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("--refresh"),
        "News help should document --refresh"
    );
}

#[test]
fn test_watch_help_documents_intervals() {
    let output = run_cli(&["watch", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--news-interval"));
    assert!(stdout.contains("--markets-interval"));
}

#[test]
fn test_cache_without_action_fails() {
    let output = run_cli(&["cache"]);
    assert!(
        !output.status.success(),
        "Expected cache without an action to fail"
    );
}

#[test]
fn test_watch_rejects_non_numeric_interval() {
    let output = run_cli(&["watch", "--news-interval", "soon"]);
    assert!(
        !output.status.success(),
        "Expected non-numeric interval to fail"
    );
}
