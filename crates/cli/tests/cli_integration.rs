//! CLI integration tests for the `eval` and `check` subcommands.
//!
//! Uses `assert_cmd` to spawn the `docket` binary and verify
//! exit codes, stdout content, and stderr content.
//!
//! All tests set `current_dir` to the workspace root so that relative
//! paths to test fixtures resolve correctly.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FIXTURES: &str = "crates/cli/tests/fixtures";

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    // crates/cli -> workspace root is two levels up
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

/// Helper: create a Command for the `docket` binary, rooted at workspace.
fn docket() -> Command {
    let mut cmd = cargo_bin_cmd!("docket");
    cmd.current_dir(workspace_root());
    cmd.env_remove("DOCKET_LOG");
    cmd
}

fn fixture(name: &str) -> String {
    format!("{}/{}", FIXTURES, name)
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    docket()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Docket rule set evaluator"));
}

#[test]
fn version_exits_0() {
    docket()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("docket"));
}

#[test]
fn eval_help_lists_facts_flag() {
    docket()
        .args(["eval", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--facts"));
}

// ──────────────────────────────────────────────
// 2. Eval subcommand
// ──────────────────────────────────────────────

#[test]
fn eval_pricing_prints_value() {
    docket()
        .args([
            "eval",
            &fixture("pricing.rules.json"),
            "--facts",
            &fixture("friday_314.facts.json"),
        ])
        .assert()
        .success()
        .stdout(predicate::str::diff("8\n"));
}

#[test]
fn eval_json_output_wraps_value() {
    let output = docket()
        .args([
            "eval",
            &fixture("pricing.rules.json"),
            "--facts",
            &fixture("friday_314.facts.json"),
            "--output",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json, serde_json::json!({ "value": 8 }));
}

#[test]
fn eval_with_zones_file() {
    docket()
        .args([
            "eval",
            &fixture("overnight.rules.json"),
            "--facts",
            &fixture("overnight.facts.json"),
            "--zones",
            &fixture("zones.toml"),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(":overnight"));
}

#[test]
fn eval_unknown_zone_without_zones_file_exits_1() {
    docket()
        .args([
            "eval",
            &fixture("overnight.rules.json"),
            "--facts",
            &fixture("overnight.facts.json"),
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("America/New_York"));
}

#[test]
fn eval_quiet_prints_nothing() {
    docket()
        .args([
            "eval",
            &fixture("pricing.rules.json"),
            "--facts",
            &fixture("friday_314.facts.json"),
            "--quiet",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn eval_nonexistent_rules_exits_1() {
    docket()
        .args([
            "eval",
            "nonexistent.rules.json",
            "--facts",
            &fixture("friday_314.facts.json"),
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("rules file not found"));
}

#[test]
fn eval_missing_facts_flag_fails() {
    docket()
        .args(["eval", &fixture("pricing.rules.json")])
        .assert()
        .failure();
}

#[test]
fn eval_invalid_facts_json_exits_1() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("facts.json");
    fs::write(&path, "{ not json").unwrap();

    docket()
        .args([
            "eval",
            &fixture("pricing.rules.json"),
            "--facts",
            path.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid JSON"));
}

#[test]
fn eval_error_as_json() {
    let tmp = TempDir::new().unwrap();
    let rules = tmp.path().join("rules.json");
    fs::write(
        &rules,
        r#"{"outcomes": [{"value": 1, "when": [{"kind": "in_cyclic_order", "key": "phase", "values": [1, 2]}]}]}"#,
    )
    .unwrap();
    let facts = tmp.path().join("facts.json");
    fs::write(&facts, r#"{"phase": 1}"#).unwrap();

    let output = docket()
        .args([
            "eval",
            rules.to_str().unwrap(),
            "--facts",
            facts.to_str().unwrap(),
            "--output",
            "json",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let err: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    let msg = err["error"].as_str().unwrap();
    assert!(msg.contains("not implemented"), "{}", msg);
}

// ──────────────────────────────────────────────
// 3. Check subcommand
// ──────────────────────────────────────────────

#[test]
fn check_reports_outcome_count() {
    docket()
        .args(["check", &fixture("pricing.rules.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 outcome(s)"));
}

#[test]
fn check_json_output() {
    let output = docket()
        .args(["check", &fixture("pricing.rules.json"), "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["outcomes"], 3);
    assert_eq!(json["fallback"], 0);
}

#[test]
fn check_unknown_kind_exits_1() {
    let tmp = TempDir::new().unwrap();
    let rules = tmp.path().join("rules.json");
    fs::write(
        &rules,
        r#"{"conditions": [{"kind": "matches", "key": "name", "value": "b"}]}"#,
    )
    .unwrap();

    docket()
        .args(["check", rules.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown condition kind"));
}

#[test]
fn check_bad_zones_file_exits_1() {
    let tmp = TempDir::new().unwrap();
    let zones = tmp.path().join("zones.toml");
    fs::write(&zones, "[zones.\"Asia/Tokyo\"]\noffset = \"nine\"\n").unwrap();

    docket()
        .args([
            "check",
            &fixture("pricing.rules.json"),
            "--zones",
            zones.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid offset"));
}
