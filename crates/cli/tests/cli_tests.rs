//! CLI integration tests

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const FEATURES: &str = r#"["glucose", "bmi", "age"]"#;
const MODEL: &str = r#"{"intercept": -6.0, "coefficients": [0.04, 0.05, 0.01]}"#;

/// Run the binary with an isolated home directory so no user config leaks in
fn dscore(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dscore"))
        .args(args)
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("DSCORE_API_URL")
        .env_remove("DSCORE_MODEL_PATH")
        .env_remove("DSCORE_FEATURES_PATH")
        .output()
        .expect("Failed to execute command")
}

fn write_artifacts(dir: &TempDir) -> (String, String) {
    let model = dir.path().join("model.json");
    let features = dir.path().join("features.json");
    std::fs::write(&model, MODEL).unwrap();
    std::fs::write(&features, FEATURES).unwrap();
    (
        model.to_string_lossy().into_owned(),
        features.to_string_lossy().into_owned(),
    )
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    let output = dscore(home.path(), &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Diabetes Risk Scorer"),
        "Should show app name"
    );
    assert!(stdout.contains("score"), "Should show score command");
    assert!(stdout.contains("schema"), "Should show schema command");
    assert!(stdout.contains("health"), "Should show health command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    let output = dscore(home.path(), &["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("dscore"), "Should show binary name");
}

/// Test score subcommand help
#[test]
fn test_score_help() {
    let home = TempDir::new().unwrap();
    let output = dscore(home.path(), &["score", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Score help should succeed");
    assert!(stdout.contains("--input"), "Should show input option");
    assert!(stdout.contains("--data"), "Should show data option");
    assert!(stdout.contains("--remote"), "Should show remote option");
}

/// Input and data are mutually exclusive
#[test]
fn test_score_rejects_input_and_data() {
    let home = TempDir::new().unwrap();
    let output = dscore(home.path(), &["score", "--input", "x.json", "--data", "[]"]);
    assert!(!output.status.success());
}

#[test]
fn test_local_score_json_output() {
    let dir = TempDir::new().unwrap();
    let (model, features) = write_artifacts(&dir);
    let output = dscore(
        dir.path(),
        &[
            "--format",
            "json",
            "score",
            "--model",
            &model,
            "--features",
            &features,
            "--data",
            r#"[{"glucose": 200, "bmi": 40, "age": 60}, {"glucose": 50, "bmi": 18, "age": 20}]"#,
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["predictions"], serde_json::json!([1, 0]));
    let probabilities = body["probabilities"].as_array().unwrap();
    assert_eq!(probabilities.len(), 2);
    assert!(probabilities[0].as_f64().unwrap() > 0.9);
    assert!(probabilities[1].as_f64().unwrap() < 0.1);
}

#[test]
fn test_local_score_from_file_table_output() {
    let dir = TempDir::new().unwrap();
    let (model, features) = write_artifacts(&dir);
    let input = dir.path().join("input.json");
    std::fs::write(
        &input,
        r#"{"glucose": [210], "bmi": [35], "age": [50], "HbA1c_level": [9.0]}"#,
    )
    .unwrap();

    let output = dscore(
        dir.path(),
        &[
            "score",
            "--model",
            &model,
            "--features",
            &features,
            "--input",
            &input.to_string_lossy(),
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Diabetes Risk Predictions"));
    assert!(stdout.contains("High Risk of Diabetes"));
    assert!(stdout.contains("Total: 1 rows"));
}

#[test]
fn test_local_score_missing_artifacts_fails() {
    let dir = TempDir::new().unwrap();
    let output = dscore(
        dir.path(),
        &[
            "--format",
            "json",
            "score",
            "--model",
            &dir.path().join("absent.json").to_string_lossy(),
            "--features",
            &dir.path().join("absent_features.json").to_string_lossy(),
            "--data",
            "[]",
        ],
    );

    assert!(!output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["error"], "Model or feature file not found.");
}

#[test]
fn test_schema_lists_columns() {
    let dir = TempDir::new().unwrap();
    let (_, features) = write_artifacts(&dir);
    let output = dscore(dir.path(), &["--format", "json", "schema", "--features", &features]);

    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body, serde_json::json!(["glucose", "bmi", "age"]));
}
