//! Integration tests for the rtvars CLI
//!
//! Each test runs the built binary and checks output and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Custom predicate to check if output is valid JSON
fn is_json() -> impl predicates::Predicate<[u8]> {
    predicates::function::function(|s: &[u8]| {
        std::str::from_utf8(s).is_ok_and(|text| serde_json::from_str::<Value>(text).is_ok())
    })
}

fn rtvars() -> Result<Command, Box<dyn std::error::Error>> {
    Ok(Command::cargo_bin("rtvars")?)
}

fn write_config(dir: &TempDir, name: &str, body: &str) -> Result<std::path::PathBuf, std::io::Error> {
    let path = dir.path().join(name);
    fs::write(&path, body)?;
    Ok(path)
}

#[test]
fn test_cli_help() -> TestResult {
    rtvars()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("history buffer"));
    Ok(())
}

#[test]
fn test_cli_version() -> TestResult {
    rtvars()?
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rtvars"));
    Ok(())
}

#[test]
fn test_schema_human_output() -> TestResult {
    rtvars()?
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("robot.joint.q_command"))
        .stdout(predicate::str::contains("robot.status.mode"));
    Ok(())
}

#[test]
fn test_schema_json_output() -> TestResult {
    rtvars()?
        .args(["schema", "--json"])
        .assert()
        .success()
        .stdout(is_json());

    let output = rtvars()?.args(["schema", "--json"]).output()?;
    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["success"], true);
    assert_eq!(json["schema"]["root"], "robot");
    let variables = json["schema"]["variables"]
        .as_array()
        .ok_or("variables not an array")?;
    assert_eq!(variables.len(), 7);
    Ok(())
}

#[test]
fn test_schema_uses_configured_policy() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "reject.yaml", "bounds_policy: reject\n")?;

    let output = rtvars()?
        .args(["schema", "--json", "--config"])
        .arg(&path)
        .output()?;
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout)?;
    let command = json["schema"]["variables"]
        .as_array()
        .and_then(|vars| {
            vars.iter()
                .find(|v| v["path"] == "robot.joint.q_command")
        })
        .ok_or("q_command missing")?;
    assert_eq!(command["policy"], "reject");
    Ok(())
}

#[test]
fn test_simulate_prints_window() -> TestResult {
    let output = rtvars()?
        .args(["simulate", "--ticks", "100", "--dt", "0.01", "--window", "3"])
        .output()?;
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout)?;
    let simulation = &json["simulation"];
    assert_eq!(simulation["ticks"], 100);
    assert_eq!(simulation["counters"]["ticks_written"], 100);
    let ticks: Vec<u64> = simulation["rows"]
        .as_array()
        .ok_or("rows not an array")?
        .iter()
        .filter_map(|row| row["tick"].as_u64())
        .collect();
    assert_eq!(ticks, [97, 98, 99]);
    Ok(())
}

#[test]
fn test_simulate_capacity_from_json_config() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "small.json", r#"{"buffer": {"capacity": 8}}"#)?;

    let output = rtvars()?
        .args(["simulate", "--ticks", "50", "--dt", "0.01", "--window", "20", "--config"])
        .arg(&path)
        .output()?;
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["simulation"]["capacity"], 8);
    assert_eq!(
        json["simulation"]["rows"].as_array().map(Vec::len),
        Some(8)
    );
    Ok(())
}

#[test]
fn test_invalid_config_exit_code() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "zero.yaml", "buffer:\n  capacity: 0\n")?;

    rtvars()?
        .args(["simulate", "--ticks", "10", "--dt", "0.01", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("capacity must be positive"));
    Ok(())
}

#[test]
fn test_unsupported_extension_exit_code() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "settings.toml", "capacity = 8\n")?;

    rtvars()?
        .args(["schema", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .code(2);
    Ok(())
}

#[test]
fn test_disallowed_kind_exit_code() -> TestResult {
    let dir = TempDir::new()?;
    let path = write_config(&dir, "doubles.yml", "variable_kinds: [double]\n")?;

    rtvars()?
        .args(["schema", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid configuration"));
    Ok(())
}

#[test]
fn test_missing_config_file_exit_code() -> TestResult {
    let dir = TempDir::new()?;

    rtvars()?
        .args(["schema", "--config"])
        .arg(dir.path().join("absent.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("absent.yaml"));
    Ok(())
}

#[test]
fn test_bad_filter_parameter_exit_code() -> TestResult {
    rtvars()?
        .args(["simulate", "--ticks", "10", "--dt", "0.01", "--dead-band=-1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("dead_band"));
    Ok(())
}

#[test]
fn test_bad_timestep_rejected_by_parser() -> TestResult {
    rtvars()?
        .args(["simulate", "--ticks", "10", "--dt", "-0.5"])
        .assert()
        .failure()
        .code(2);
    Ok(())
}
