// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn stagecraft(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("stagecraft").unwrap();
    cmd.current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("STAGECRAFT_ARTIFACT_ROOT")
        .env_remove("RUST_LOG");
    cmd
}

fn write_pipeline(dir: &Path, yaml: &str) {
    fs::write(dir.join("stagecraft.yaml"), yaml).unwrap();
}

#[test]
fn init_then_run_builds_every_stage() {
    let temp_dir = TempDir::new().unwrap();

    stagecraft(temp_dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created stagecraft.yaml"));

    stagecraft(temp_dir.path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 stage(s)"));

    let store = temp_dir.path().join(".stagecraft/artifacts");
    assert!(store.join("lib/liblib.a").exists());
    assert!(store.join("lib_dyn/liblib_dyn.so").exists());

    let app = fs::read_to_string(store.join("exe/app")).unwrap();
    assert_eq!(app, "lib\nlib\nlib_dyn\n");
}

#[test]
fn init_refuses_to_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    write_pipeline(temp_dir.path(), "name: mine\nstages: []\n");

    stagecraft(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let kept = fs::read_to_string(temp_dir.path().join("stagecraft.yaml")).unwrap();
    assert_eq!(kept, "name: mine\nstages: []\n");
}

#[test]
fn missing_dependency_fails_before_running() {
    let temp_dir = TempDir::new().unwrap();
    write_pipeline(
        temp_dir.path(),
        r#"
name: broken
stages:
  - name: lib
    run: "touch lib-ran"
  - name: exe
    run: "true"
    depends_on: [ghost]
"#,
    );

    stagecraft(temp_dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such dependency: ghost"));

    assert!(!temp_dir.path().join("lib-ran").exists());
}

#[test]
fn cycle_fails_before_running() {
    let temp_dir = TempDir::new().unwrap();
    write_pipeline(
        temp_dir.path(),
        r#"
name: cyclic
stages:
  - name: a
    run: "touch a-ran"
    depends_on: [b]
  - name: b
    run: "touch b-ran"
    depends_on: [a]
"#,
    );

    stagecraft(temp_dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dependency cycle detected"));

    assert!(!temp_dir.path().join("a-ran").exists());
    assert!(!temp_dir.path().join("b-ran").exists());
}

#[test]
fn two_artifacts_rejected() {
    let temp_dir = TempDir::new().unwrap();
    write_pipeline(
        temp_dir.path(),
        r#"
name: greedy
stages:
  - name: lib
    run: "true"
    artifact: [out/a, out/b]
"#,
    );

    stagecraft(temp_dir.path())
        .args(["validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only one artifact allowed, found: 2"));
}

#[test]
fn stage_flag_runs_only_that_stage() {
    let temp_dir = TempDir::new().unwrap();
    write_pipeline(
        temp_dir.path(),
        r#"
name: partial
stages:
  - name: lib
    run: "touch lib-ran"
  - name: lib_dyn
    run: "touch lib_dyn-ran"
    depends_on: [lib]
  - name: exe
    run: "touch exe-ran"
    depends_on: [lib_dyn]
"#,
    );

    stagecraft(temp_dir.path())
        .args(["run", "--stage", "lib_dyn"])
        .assert()
        .success();

    assert!(!temp_dir.path().join("lib-ran").exists());
    assert!(temp_dir.path().join("lib_dyn-ran").exists());
    assert!(!temp_dir.path().join("exe-ran").exists());
}

#[test]
fn unknown_stage_flag_fails() {
    let temp_dir = TempDir::new().unwrap();
    write_pipeline(temp_dir.path(), "name: p\nstages:\n  - name: lib\n    run: \"true\"\n");

    stagecraft(temp_dir.path())
        .args(["run", "--stage", "docs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown stage: 'docs'"));
}

#[test]
fn failing_stage_stops_the_run() {
    let temp_dir = TempDir::new().unwrap();
    write_pipeline(
        temp_dir.path(),
        r#"
name: failing
stages:
  - name: lib
    run: "exit 3"
  - name: exe
    run: "touch exe-ran"
    depends_on: [lib]
"#,
    );

    stagecraft(temp_dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Stage 'lib' failed"));

    assert!(!temp_dir.path().join("exe-ran").exists());
}

#[test]
fn rerun_replaces_artifact() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = |file: &str| {
        format!(
            "name: rerun\nstages:\n  - name: lib\n    run: \"rm -rf out && mkdir -p out && touch out/{}\"\n    artifact: out\n",
            file
        )
    };

    write_pipeline(temp_dir.path(), &pipeline("first.o"));
    stagecraft(temp_dir.path()).arg("run").assert().success();

    write_pipeline(temp_dir.path(), &pipeline("second.o"));
    stagecraft(temp_dir.path()).arg("run").assert().success();

    let stored = temp_dir.path().join(".stagecraft/artifacts/lib");
    assert!(stored.join("second.o").exists());
    assert!(!stored.join("first.o").exists());
}

#[test]
fn artifact_root_flag_overrides_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    write_pipeline(
        temp_dir.path(),
        "name: p\nstages:\n  - name: lib\n    run: \"mkdir -p out && touch out/lib.a\"\n    artifact: out\n",
    );

    stagecraft(temp_dir.path())
        .arg("run")
        .arg("--artifact-root")
        .arg(store.path())
        .assert()
        .success();

    assert!(store.path().join("lib/lib.a").exists());
    assert!(!temp_dir.path().join(".stagecraft").exists());
}

#[test]
fn show_dep_tree_prints_table() {
    let temp_dir = TempDir::new().unwrap();

    stagecraft(temp_dir.path()).arg("init").assert().success();

    stagecraft(temp_dir.path())
        .args(["run", "--show-dep-tree", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-------- DEPS --------"))
        .stdout(predicate::str::contains("exe -> [lib, lib_dyn]"))
        .stdout(predicate::str::contains("1. lib"));

    assert!(!temp_dir.path().join(".stagecraft").exists());
}

#[test]
fn show_dep_tree_waits_for_validation() {
    let temp_dir = TempDir::new().unwrap();
    write_pipeline(
        temp_dir.path(),
        r#"
name: broken
stages:
  - name: exe
    run: "true"
    depends_on: [ghost]
"#,
    );

    stagecraft(temp_dir.path())
        .args(["run", "--show-dep-tree"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("-------- DEPS --------").not())
        .stderr(predicate::str::contains("no such dependency: ghost"));
}

#[test]
fn graph_renders_mermaid() {
    let temp_dir = TempDir::new().unwrap();

    stagecraft(temp_dir.path()).arg("init").assert().success();

    stagecraft(temp_dir.path())
        .args(["graph", "--format", "mermaid"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graph TD"))
        .stdout(predicate::str::contains("lib --> lib_dyn"))
        .stdout(predicate::str::contains("lib_dyn --> exe"));
}

#[test]
fn artifacts_path_and_clear() {
    let temp_dir = TempDir::new().unwrap();

    stagecraft(temp_dir.path()).arg("init").assert().success();
    stagecraft(temp_dir.path()).arg("run").assert().success();

    stagecraft(temp_dir.path())
        .args(["artifacts", "path", "exe"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".stagecraft/artifacts/exe"));

    stagecraft(temp_dir.path())
        .args(["artifacts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 artifact(s)"));

    stagecraft(temp_dir.path())
        .args(["artifacts", "clear", "--yes"])
        .assert()
        .success();

    assert!(!temp_dir.path().join(".stagecraft/artifacts/exe").exists());
}

#[test]
fn missing_pipeline_suggests_init() {
    let temp_dir = TempDir::new().unwrap();

    stagecraft(temp_dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stagecraft init"));
}
