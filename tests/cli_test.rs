#![allow(deprecated)]

//! Binary smoke tests
//!
//! Only commands that need no network are executed.

use assert_cmd::Command;
use predicates::prelude::*;
mod common;

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("helpdesk").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("agents"))
        .stdout(predicate::str::contains("simulate"));
}

#[test]
fn test_demo_prints_comparison_table() {
    let (_temp_dir, config_path) = common::temp_config_file("support:\n  offline: true\n");
    let mut cmd = Command::cargo_bin("helpdesk").unwrap();
    cmd.arg("--config").arg(config_path).arg("demo").arg("-n").arg("5");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Service level comparison"))
        .stdout(predicate::str::contains("enterprise"));
}

#[test]
fn test_simulate_batch_prints_summary() {
    let (_temp_dir, config_path) = common::temp_config_file("sentiment:\n  window_minutes: 10\n");
    let mut cmd = Command::cargo_bin("helpdesk").unwrap();
    cmd.arg("--config")
        .arg(config_path)
        .args(["simulate", "--scenario", "positive", "--batch", "20"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Samples:   20"));
}

#[test]
fn test_invalid_scenario_is_rejected() {
    let mut cmd = Command::cargo_bin("helpdesk").unwrap();
    cmd.args(["simulate", "--scenario", "chaotic"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown scenario"));
}

#[test]
fn test_invalid_config_fails_validation() {
    let (_temp_dir, config_path) = common::temp_config_file("polling:\n  max_attempts: 0\n");
    let mut cmd = Command::cargo_bin("helpdesk").unwrap();
    cmd.arg("--config").arg(config_path).arg("demo");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("must be greater than 0"));
}
