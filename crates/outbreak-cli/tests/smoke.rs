//! Binary smoke tests: validate, render, and fail the way a user sees.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

const SAMPLE: &str = r#"
game:
  funding_rate: 4
  turn_num: 1
turns:
  - turn: -1
    infections:
      - { city: "Atlanta" }
      - { city: "Cairo" }
      - { city: "Tokyo" }
  - turn: 0
    infections:
      - { city: "Lima" }
      - { city: "Paris" }
  - turn: 1
    epidemics: ["Sydney"]
    infections:
      - { city: "Atlanta" }
"#;

fn write_sample(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("game.yaml");
    let mut file = std::fs::File::create(&path).expect("create sample log");
    file.write_all(contents.as_bytes()).expect("write sample log");
    path
}

#[test]
fn validate_only_reports_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(&dir, SAMPLE);

    Command::cargo_bin("outbreak")
        .unwrap()
        .arg(&path)
        .arg("--validate-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 turns"))
        .stdout(predicate::str::contains("48 cities"));
}

#[test]
fn text_report_names_the_reshuffled_cities() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(&dir, SAMPLE);

    Command::cargo_bin("outbreak")
        .unwrap()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("epidemics: 1 seen"))
        .stdout(predicate::str::contains("Cairo"));
}

#[test]
fn json_report_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(&dir, SAMPLE);

    let output = Command::cargo_bin("outbreak")
        .unwrap()
        .arg(&path)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["epidemics_seen"], 1);
    assert!(value["cities"].as_array().unwrap().len() == 48);
}

#[test]
fn unknown_city_fails_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(&dir, &SAMPLE.replace("Lima", "Gotham"));

    Command::cargo_bin("outbreak")
        .unwrap()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Gotham"));
}

#[test]
fn missing_file_fails_cleanly() {
    Command::cargo_bin("outbreak")
        .unwrap()
        .arg("no-such-game.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-game.yaml"));
}
