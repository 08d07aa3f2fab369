// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn jig(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lanesched-jig").expect("binary built");
    cmd.env_remove("RUST_LOG")
        .arg("--no-warmup")
        .arg("--config")
        .arg(config);
    cmd
}

fn config_file(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("jig.json");
    fs::write(&path, body).expect("write config");
    path
}

#[test]
fn schedule_batch_reports_batches() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = config_file(&dir, "{}");
    jig(&cfg)
        .args(["schedule-batch", "--qlen", "256", "--modulo", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("schedule_batch(256, 4)"))
        .stdout(predicate::str::contains("ns per item"));
}

#[test]
fn schedule_batch_rejects_zero_modulo() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = config_file(&dir, "{}");
    jig(&cfg)
        .args(["schedule-batch", "--modulo", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));
}

#[test]
fn config_values_fill_unset_flags() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = config_file(&dir, r#"{"schedule": {"qlen": 100, "modulo": 1}}"#);
    jig(&cfg)
        .arg("schedule-batch")
        .assert()
        .success()
        .stdout(predicate::str::contains("schedule_batch(100, 1)"));
}

#[test]
fn accounts_tables_agree() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = config_file(&dir, r#"{"accounts": {"max_amount": 25}}"#);
    jig(&cfg)
        .args([
            "accounts",
            "--accounts",
            "64",
            "--transfers",
            "5000",
            "--seed",
            "11",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("identical"))
        .stdout(predicate::str::contains("guarded rounds"));
}

#[test]
fn conflict_sweep_runs() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = config_file(&dir, "{}");
    jig(&cfg)
        .args(["conflict", "--lanes", "16", "--iterations", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("conflicting lane share"));
}

#[test]
fn malformed_config_fails_with_context() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = config_file(&dir, "{ nope");
    jig(&cfg)
        .arg("conflict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load jig config"));
}

#[test]
fn missing_config_file_means_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("absent.json");
    jig(&missing)
        .args(["schedule-batch", "--qlen", "64"])
        .assert()
        .success()
        .stdout(predicate::str::contains("schedule_batch(64, 16)"));
}

#[test]
fn init_config_writes_resolved_config_once() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("nested").join("jig.json");
    jig(&path)
        .arg("init-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("init-config"));

    let bytes = fs::read(&path).expect("config written");
    let written: serde_json::Value = serde_json::from_slice(&bytes).expect("valid json");
    assert_eq!(written["seed"], 0x5EED);
    assert_eq!(written["schedule"]["modulo"], 16);

    jig(&path)
        .arg("init-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    jig(&path)
        .args(["init-config", "--force"])
        .assert()
        .success();
}
