//! Integration tests for the `mo` CLI.
//!
//! Each test points the binary at a state file in a temp directory, runs it
//! as a subprocess, and checks the JSON output and/or file contents.

use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

/// Path to the built `mo` binary.
fn mo_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("mo");
    path
}

fn mo(file: &std::path::Path, args: &[&str]) -> Output {
    Command::new(mo_bin())
        .arg("--file")
        .arg(file)
        .args(args)
        .output()
        .expect("failed to run mo")
}

fn json_stdout(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn add_done_stats_flow() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("tracker.json");

    let output = mo(
        &file,
        &[
            "add", "Pay rent", "--category", "admin", "--quadrant", "I", "--json",
        ],
    );
    let task = json_stdout(&output);
    let id = task["id"].as_str().expect("task id").to_string();
    assert_eq!(task["quadrant"], "urgent_important");
    assert_eq!(task["done"], false);
    assert!(file.exists());

    let output = mo(&file, &["done", &id, "--json"]);
    let done = json_stdout(&output);
    assert_eq!(done["done"], true);
    assert_eq!(done["awarded"], true);
    assert_eq!(done["points"], 20);
    assert_eq!(done["streak"], 1);

    let output = mo(&file, &["stats", "--json"]);
    let stats = json_stdout(&output);
    assert_eq!(stats["points"], 20);
    assert_eq!(stats["level"], 1);
    assert_eq!(stats["done_today"], 1);
    assert!(stats["badges"]
        .as_array()
        .unwrap()
        .iter()
        .any(|b| b == "First Step"));
}

#[test]
fn reopen_keeps_points_and_same_day_redo_does_not_double_award() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("tracker.json");

    let output = mo(
        &file,
        &[
            "add", "Call plumber", "--category", "admin", "--quadrant", "q3", "--json",
        ],
    );
    let id = json_stdout(&output)["id"].as_str().unwrap().to_string();

    let first = json_stdout(&mo(&file, &["done", &id, "--json"]));
    assert_eq!(first["points"], 10);

    let reopened = json_stdout(&mo(&file, &["done", &id, "--json"]));
    assert_eq!(reopened["done"], false);
    assert_eq!(reopened["points"], 10);

    let redone = json_stdout(&mo(&file, &["done", &id, "--json"]));
    assert_eq!(redone["done"], true);
    assert_eq!(redone["awarded"], false);
    assert_eq!(redone["points"], 10);
}

#[test]
fn delete_requires_confirm() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("tracker.json");

    let output = mo(
        &file,
        &[
            "add", "One-off", "--category", "health", "--quadrant", "IV", "--json",
        ],
    );
    let id = json_stdout(&output)["id"].as_str().unwrap().to_string();

    let preview = json_stdout(&mo(&file, &["delete", &id, "--json"]));
    assert_eq!(preview["confirmed"], false);

    // Still there
    let sections = json_stdout(&mo(&file, &["list", "--json"]));
    let total: usize = sections
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["tasks"].as_array().unwrap().len())
        .sum();
    assert_eq!(total, 1);

    let deleted = json_stdout(&mo(&file, &["delete", &id, "--confirm", "--json"]));
    assert_eq!(deleted["deleted"].as_str().unwrap(), id);

    let sections = json_stdout(&mo(&file, &["list", "--json"]));
    let total: usize = sections
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["tasks"].as_array().unwrap().len())
        .sum();
    assert_eq!(total, 0);
}

#[test]
fn corrupt_state_file_degrades_to_empty() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("tracker.json");
    std::fs::write(&file, "not json {{{").unwrap();

    let output = mo(&file, &["list"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no tasks"));
}

#[test]
fn unknown_task_id_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("tracker.json");

    let output = mo(&file, &["done", "no-such-id"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no task matches"));
}
