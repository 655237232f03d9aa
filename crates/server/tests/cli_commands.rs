use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::{tempdir, TempDir};

fn setup_repo() -> TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::write(root.join("setup.cfg"), "[metadata]\nname = shapes\n").unwrap();
    fs::write(
        root.join("shapes.py"),
        r"
class Shape:
    def area(self) -> float:
        return 0.0

    def describe(self):
        return 'shape'


class Square(Shape):
    def area(self) -> float:
        return 1.0
",
    )
    .unwrap();
    temp
}

#[allow(deprecated)]
fn cli() -> Command {
    let mut cmd = Command::cargo_bin("override-hints").expect("binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn analyze_prints_json_array() {
    let temp = setup_repo();
    let output = cli()
        .arg("analyze")
        .arg(temp.path().join("shapes.py"))
        .output()
        .expect("command run");

    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let records = body.as_array().expect("array");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["type"], "child_override");
    assert_eq!(records[0]["class"], "Square");
    assert_eq!(records[0]["signature"], "area(self) -> float");
    assert_eq!(records[0]["base"], "Shape");
    assert_eq!(records[1]["type"], "parent_overridden");
    assert_eq!(records[1]["class"], "Shape");
    assert_eq!(records[1]["child"], "Square");
}

#[test]
fn analyze_without_overrides_prints_empty_array() {
    let temp = setup_repo();
    let lonely = temp.path().join("lonely.py");
    fs::write(&lonely, "class Lonely:\n    def run(self):\n        pass\n").unwrap();

    cli()
        .args(["analyze", "--no-cache"])
        .arg(&lonely)
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn analyze_pretty_is_indented() {
    let temp = setup_repo();
    cli()
        .args(["analyze", "--pretty"])
        .arg(temp.path().join("shapes.py"))
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[\n  {"));
}

#[test]
fn unreadable_target_fails() {
    let temp = setup_repo();
    cli()
        .arg("analyze")
        .arg(temp.path().join("missing.py"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Cannot read"));
}

#[test]
fn serve_answers_each_line() {
    let temp = setup_repo();
    let target = temp.path().join("shapes.py");
    let request = serde_json::json!({
        "id": 42,
        "command": "analyze",
        "data": {"file_path": target}
    });
    let input = format!("garbage\n{request}\n{{\"id\": 43, \"command\": \"nope\"}}\n");

    let output = cli()
        .arg("serve")
        .write_stdin(input)
        .output()
        .expect("command run");

    assert!(output.status.success());
    let lines: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["type"], "ready");
    assert_eq!(lines[1]["id"], 42);
    assert_eq!(lines[1]["result"].as_array().map(Vec::len), Some(2));
    assert_eq!(lines[2]["id"], 43);
    assert!(lines[2]["error"].is_string());
}

#[test]
fn schema_describes_records() {
    cli()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("child_signature"))
        .stdout(predicate::str::contains("schema_version"));
}

#[test]
fn global_flags_are_accepted() {
    let temp = setup_repo();
    cli()
        .args([
            "--quiet",
            "--rescan-interval-ms",
            "0",
            "--max-files",
            "10",
            "--max-workspaces",
            "1",
            "--exclude-dir",
            "migrations",
            "analyze",
        ])
        .arg(temp.path().join("shapes.py"))
        .assert()
        .success();
}
