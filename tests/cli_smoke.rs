//! Smoke tests for the `jabfi-conformance` binary

#![cfg(unix)]

use std::fs;
use std::process::Command;

fn harness() -> Command {
    Command::new(env!("CARGO_BIN_EXE_jabfi-conformance"))
}

#[test]
fn passing_run_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("hello_world.b"), "printf 'Hello World!\\n'\n").unwrap();
    fs::write(dir.path().join("extra.b"), "printf 'x'\n").unwrap();

    let output = harness()
        .arg("--dir")
        .arg(dir.path())
        .args(["--executable", "/bin/sh", "--timeout-ms", "5000"])
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stdout}\n{stderr}");
    assert!(stdout.starts_with("[*] Running 2 tests"));
    assert!(stdout.contains("hello_world.b : TEST OK ("));
    assert!(stdout.contains("[*] 1 passed, 0 failed, 1 skipped"));
    assert!(stderr.contains("extra.b"));
}

#[test]
fn failing_run_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("h.b"), "printf 'I'\n").unwrap();

    let output = harness()
        .arg("--dir")
        .arg(dir.path())
        .args(["--executable", "/bin/sh"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("h.b : TEST FAILED"));
}

#[test]
fn missing_executable_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("h.b"), "").unwrap();

    let output = harness()
        .arg("--dir")
        .arg(dir.path())
        .arg("--executable")
        .arg(dir.path().join("no-jabfi"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("interpreter executable not found"));
}

#[test]
fn executable_name_is_looked_up_on_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("h.b"), "printf 'H'\n").unwrap();

    let output = harness().arg("--dir").arg(dir.path()).args(["--executable", "sh"]).output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{stdout}\n{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("h.b : TEST OK"));
}

#[test]
fn malformed_fixture_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let fixtures = dir.path().join("fixtures.json");
    fs::write(&fixtures, "{ not json").unwrap();

    let output = harness().arg("--fixtures").arg(&fixtures).arg("--list-fixtures").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed fixture file"));
}

#[test]
fn json_report_is_line_delimited() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("h.b"), "printf 'H'\n").unwrap();

    let output = harness()
        .arg("--dir")
        .arg(dir.path())
        .args(["--executable", "/bin/sh", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let events: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(events.first().unwrap()["event"], "collected");
    assert_eq!(events[1]["name"], "h.b");
    assert_eq!(events.last().unwrap()["passed"], 1);
}

#[test]
fn fixture_file_replaces_builtin_table() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("nul.b"), "exec od -An -tx1\n").unwrap();
    let fixtures = dir.path().join("fixtures.json");
    fs::write(
        &fixtures,
        r#"{
            "label": "custom",
            "fixtures": [ { "name": "nul.b", "stdin": [104, 13, 10, 0], "stdout": " 68 0d 0a 00" } ]
        }"#,
    )
    .unwrap();

    let output = harness()
        .arg("--dir")
        .arg(dir.path())
        .args(["--executable", "/bin/sh"])
        .arg("--fixtures")
        .arg(&fixtures)
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{stdout}");
    assert!(stdout.contains("nul.b : TEST OK"));
}

#[test]
fn list_fixtures_prints_sorted_names() {
    let output = harness().args(["--list-fixtures", "--generation", "v1"]).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let names: Vec<&str> = stdout.lines().skip(1).map(str::trim).collect();
    assert_eq!(
        names,
        vec!["h.b", "hello_world.b", "pound_symbol.b", "squares.b", "unmatched1.b", "unmatched2.b"]
    );
}
