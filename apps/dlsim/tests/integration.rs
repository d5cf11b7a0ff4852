//! Integration tests for dlsim CLI

use std::process::Command;

fn dlsim() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dlsim"));
    // Keep the user's environment from leaking into the run
    for var in [
        "DLSIM_MODE",
        "DLSIM_VICTIM_POLICY",
        "DLSIM_PROCESSES",
        "DLSIM_RESOURCES",
        "DLSIM_SEED",
        "DLSIM_OUTPUT",
        "DLSIM_COLOR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn json_output(args: &[&str]) -> serde_json::Value {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "").expect("write config");

    let output = dlsim()
        .arg("--json")
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .expect("Failed to execute dlsim");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
}

#[test]
fn test_cli_version() {
    let output = dlsim()
        .arg("--version")
        .output()
        .expect("Failed to execute dlsim");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("dlsim"));
}

#[test]
fn test_cli_help() {
    let output = dlsim()
        .arg("--help")
        .output()
        .expect("Failed to execute dlsim");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Deadlock detection, prevention and avoidance simulator"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("scenario"));
    assert!(stdout.contains("snapshot"));
}

#[test]
fn test_cli_invalid_command() {
    let output = dlsim()
        .arg("invalid-command")
        .output()
        .expect("Failed to execute dlsim");

    assert!(!output.status.success());
}

#[test]
fn test_banker_scenario_json() {
    let value = json_output(&["scenario", "banker"]);
    assert_eq!(value["kind"], "scenario");
    let steps = value["steps"].as_array().unwrap();
    assert_eq!(steps[4]["result"], "GRANTED");
    assert!(steps[6]["result"]
        .as_str()
        .unwrap()
        .starts_with("DENIED - exceeds maximum demand"));
    assert_eq!(value["snapshot"]["mode"], "avoidance");
}

#[test]
fn test_detection_scenario_json() {
    let value = json_output(&["scenario", "detection"]);
    assert_eq!(value["snapshot"]["last_cycle"], serde_json::json!(["P0", "P1"]));
    assert_eq!(value["snapshot"]["processes"]["P0"]["state"], "terminated");
    assert_eq!(value["snapshot"]["counters"]["recoveries"], 1);
}

#[test]
fn test_snapshot_clamps_counts() {
    let value = json_output(&["snapshot", "--processes", "0", "--resources", "2", "--seed", "3"]);
    assert_eq!(value["kind"], "snapshot");
    assert_eq!(value["processes"].as_object().unwrap().len(), 1);
    assert_eq!(value["resources"].as_object().unwrap().len(), 2);
}

#[test]
fn test_run_is_reproducible_with_seed() {
    let args = ["run", "--steps", "15", "--seed", "21", "--verify", "--mode", "prevention"];
    let first = json_output(&args);
    let second = json_output(&args);
    assert_eq!(first["steps"], second["steps"]);
    assert_eq!(first["snapshot"], second["snapshot"]);
    assert_eq!(first["verified"], true);
    assert_eq!(first["steps"].as_array().unwrap().len(), 15);
}
