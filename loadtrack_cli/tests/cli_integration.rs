use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tempfile::tempdir;

// Fast loop so multi-iteration runs finish in milliseconds.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[monitor]
zero_epsilon_kg = 0.5
loop_period_ms = 1

[calibration]
sample_count = 10
default_scale_factor = -7050.0

[hardware]
sensor_read_timeout_ms = 100
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn loadtrack() -> Command {
    let mut cmd = Command::cargo_bin("loadtrack").unwrap();
    cmd.stdin(Stdio::null());
    cmd
}

#[rstest]
#[case(&["--help"], "Usage:")]
#[case(&["self-check"], "self-check ok")]
fn cli_happy_paths(#[case] args: &[&str], #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = loadtrack();
    cmd.current_dir(dir.path());
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(needle));
}

#[test]
fn run_counts_one_simulated_load_cycle() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let store = dir.path().join("store.toml");

    // The simulated profile is 9 samples long with a single unload edge.
    let mut cmd = loadtrack();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--json")
        .arg("run")
        .arg("--store")
        .arg(&store)
        .arg("--iterations")
        .arg("9");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""load_count":1"#))
        .stdout(predicate::str::contains(r#""total_kg":3600.0"#));
}

#[test]
fn status_reports_persisted_fields() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let store = dir.path().join("store.toml");
    fs::write(
        &store,
        "load_count = 41\ntotal_weight = 125000.0\nscale_factor = -7013.7\n",
    )
    .unwrap();

    let mut cmd = loadtrack();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("status")
        .arg("--store")
        .arg(&store);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("loads:        41"))
        .stdout(predicate::str::contains("125.000 t"))
        .stdout(predicate::str::contains("-7013.70"));
}

#[test]
fn status_on_missing_store_shows_uncalibrated() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = loadtrack();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("status")
        .arg("--store")
        .arg(dir.path().join("absent.toml"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("loads:        0"))
        .stdout(predicate::str::contains("not calibrated"));
}

#[test]
fn invalid_config_is_rejected_with_hint() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    fs::write(&path, "[monitor]\nloop_period_ms = 0\n").unwrap();

    let mut cmd = loadtrack();
    cmd.arg("--config").arg(&path).arg("self-check");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("loop_period_ms"));
}

#[test]
fn json_errors_are_structured() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    fs::write(&path, "[calibration]\ndefault_scale_factor = 0.0\n").unwrap();

    let mut cmd = loadtrack();
    cmd.arg("--config").arg(&path).arg("--json").arg("self-check");

    let output = cmd.output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = stderr.lines().last().unwrap_or("");
    let v: serde_json::Value = serde_json::from_str(line).expect("structured error");
    assert!(v["message"].as_str().unwrap().contains("scale_factor"));
}
