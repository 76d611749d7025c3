use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn ctxgrab(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ctxgrab").expect("binary exists");
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join(".xdg"))
        .env_remove("CTXGRAB_MAX_FILES")
        .env_remove("CTXGRAB_SERVICE_COMMAND");
    cmd
}

#[test]
fn help_displays_usage() {
    Command::cargo_bin("ctxgrab")
        .expect("binary exists")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("tree-func"));
}

#[test]
fn list_commands_prints_sorted_json() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let output = ctxgrab(temp.path()).arg("--list-commands").output()?;
    assert!(output.status.success());

    let catalog: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout)?;
    let names: Vec<_> = catalog
        .iter()
        .filter_map(|entry| entry["name"].as_str())
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    for expected in ["tree", "tree-func", "grab", "grab-public", "summary", "smartgrab"] {
        assert!(names.contains(&expected), "missing {expected}");
    }
    assert!(catalog.iter().all(|entry| entry["description"].is_string()));
    Ok(())
}

#[test]
fn tree_prints_plain_structure() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    fs::create_dir_all(temp.path().join("pkg"))?;
    fs::write(temp.path().join("pkg/a.go"), "package pkg\n")?;

    ctxgrab(temp.path())
        .args(["tree", ".", "--no-copy"])
        .assert()
        .success()
        .stdout("└── pkg\n    └── a.go\n");
    Ok(())
}

#[test]
fn grab_writes_payload_to_output_file() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    fs::write(temp.path().join("a.go"), "package a")?;

    ctxgrab(temp.path())
        .args(["grab", "a.go", "--output", "payload.txt"])
        .assert()
        .success()
        .stderr(predicate::str::contains("payload.txt"));
    assert_eq!(
        fs::read_to_string(temp.path().join("payload.txt"))?,
        ">>> a.go\npackage a\n"
    );
    Ok(())
}

#[test]
fn grab_of_unknown_file_fails() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    ctxgrab(temp.path())
        .args(["grab", "missing.go", "-o", "payload.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
    assert!(!temp.path().join("payload.txt").exists());
    Ok(())
}

#[test]
fn grab_refuses_protected_workspace() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    fs::create_dir_all(temp.path().join("ws"))?;
    fs::write(temp.path().join("ws/ws_info.toml"), "")?;
    fs::write(temp.path().join("ws/main.go"), "package main")?;

    ctxgrab(temp.path())
        .args(["grab", "ws", "-o", "payload.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("protected workspace"));
    Ok(())
}

#[test]
fn smartgrab_reuses_staged_reply() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    fs::write(temp.path().join("a.go"), "package a")?;
    fs::write(temp.path().join("output.md"), r#"{"files": ["a.go"]}"#)?;

    ctxgrab(temp.path())
        .args(["smartgrab", "--reuse-output", "-o", "payload.txt"])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(temp.path().join("payload.txt"))?,
        ">>> a.go\npackage a\n"
    );
    Ok(())
}

#[test]
fn smartgrab_rejects_replies_with_extra_fields() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    fs::write(temp.path().join("a.go"), "package a")?;
    fs::write(
        temp.path().join("output.md"),
        r#"{"files": ["a.go"], "reason": "x"}"#,
    )?;

    ctxgrab(temp.path())
        .args(["smartgrab", "--reuse-output", "-o", "payload.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("schema"));
    Ok(())
}

#[test]
fn grab_public_lists_exported_functions() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    fs::write(
        temp.path().join("api.go"),
        "package api\n\n// Serve starts the server.\nfunc Serve() {}\n\nfunc helper() {}\n",
    )?;

    ctxgrab(temp.path())
        .arg("grab-public")
        .assert()
        .success()
        .stdout("- Serve: Serve starts the server.\n");
    Ok(())
}
