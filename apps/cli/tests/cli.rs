//! End-to-end tests for the dbauthd binary

use assert_cmd::Command;
use predicates::prelude::*;

fn dbauthd() -> Command {
    let mut cmd = Command::cargo_bin("dbauthd").unwrap();
    cmd.env_remove("DBAUTH_CONFIG")
        .env("DBAUTH_LOG__DISPLAY__COLORS", "false");
    cmd
}

#[test]
fn authorize_prints_redacted_credential() {
    dbauthd()
        .args(["authorize", "Election2024"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""login":"election2024_u1""#))
        .stdout(predicate::str::contains(r#""password":"[REDACTED]""#))
        .stdout(predicate::str::contains(r#""database_name":"Election2024""#));
}

#[test]
fn authorize_can_reveal_password() {
    let output = dbauthd()
        .args(["authorize", "Profiles", "--show-password"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let line: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let password = line["password"].as_str().unwrap();
    assert_eq!(password.len(), 32);
    assert!(password.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn authorize_rejects_control_characters() {
    dbauthd()
        .args(["authorize", "bad\tname"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid authorization request"));
}

#[test]
fn rotate_reports_each_database() {
    let output = dbauthd()
        .args(["rotate", "-d", "Orders", "-d", "Billing"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["rotated"], serde_json::json!(["Billing", "Orders"]));
    assert_eq!(report["failed"], serde_json::json!([]));
}

#[test]
fn env_overrides_file_and_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dbauth.toml");
    std::fs::write(&path, "[service.rotation]\ninterval = \"2m\"\n").unwrap();

    dbauthd()
        .arg("config")
        .arg("--config")
        .arg(&path)
        .env("DBAUTH_SERVICE__ROTATION__INITIAL_DELAY", "5s")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""interval": "2m""#))
        .stdout(predicate::str::contains(r#""initial_delay": "5s""#));
}

#[test]
fn zero_interval_is_refused() {
    dbauthd()
        .args(["run", "--interval", "0s"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));
}
