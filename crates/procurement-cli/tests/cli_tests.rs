//! Integration tests for the procurement CLI
//!
//! These exercise argument handling and input validation, which complete
//! before any network access.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn procurement_cmd() -> Command {
    let mut cmd = Command::cargo_bin("procurement").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("PROCUREMENT_CONFIG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    procurement_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("benchmark"));
}

#[test]
fn test_short_query_exits_with_invalid_input() {
    procurement_cmd()
        .args(["analyze", "ab"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("between 3 and 200"));
}

#[test]
fn test_overlong_location_exits_with_invalid_input() {
    procurement_cmd()
        .args(["analyze", "industrial steel", "--location"])
        .arg("x".repeat(101))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("location"));
}

#[test]
fn test_negative_quote_exits_with_invalid_input() {
    procurement_cmd()
        .args(["benchmark", "steel", "pipes", "--quote", "-5"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("quote must be a positive amount"));
}

#[test]
fn test_zero_quantity_exits_with_invalid_input() {
    procurement_cmd()
        .args(["--format", "json", "benchmark", "steel pipes", "--quantity", "0"])
        .assert()
        .code(3);
}

#[test]
fn test_unknown_format_is_rejected() {
    procurement_cmd()
        .args(["--format", "xml", "analyze", "steel"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("xml"));
}

#[test]
fn test_malformed_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yml");
    fs::write(&path, "search: [unterminated").unwrap();

    procurement_cmd()
        .args(["analyze", "industrial steel suppliers", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_empty_templates_config_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yml");
    fs::write(&path, "search:\n  url: http://localhost:1\n  templates: []\n").unwrap();

    procurement_cmd()
        .args(["benchmark", "steel pipes", "--config"])
        .arg(&path)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("search.templates"));
}
