//! CLI end-to-end tests for dw-core.
//!
//! These tests run the binary against small input documents written to a
//! temporary directory and check stdout payloads and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a Command for the dw-core binary, isolated from the user's config.
fn dw_core(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dw-core").expect("dw-core binary should exist");
    cmd.env_remove("DW_CONFIG")
        .env_remove("DW_CONFIG_DIR")
        .env_remove("RUST_LOG")
        .env_remove("DW_LOG")
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

/// Daily counts around `base` with a few percent of day-to-day movement.
fn wavy(base: f64, phase: f64, days: usize) -> Vec<u64> {
    (0..days)
        .map(|i| (base * (1.0 + 0.03 * (i as f64 * 1.3 + phase).sin())).round() as u64)
        .collect()
}

/// Write an input document with a drop in `ir` on day 20 of 30.
fn write_input(dir: &TempDir) -> PathBuf {
    let days = 30;
    let dates: Vec<String> = (0..days).map(|i| format!("2024-06-{:02}", i + 1)).collect();
    let mut ir = wavy(400.0, 0.5, days);
    ir[20] = 40;
    let doc = serde_json::json!({
        "dates": dates,
        "series": {
            "de": wavy(9000.0, 0.0, days),
            "fr": wavy(8000.0, 1.0, days),
            "gb": wavy(7000.0, 2.0, days),
            "nl": wavy(6000.0, 3.0, days),
            "se": wavy(5000.0, 4.0, days),
            "us": wavy(4500.0, 5.0, days),
            "ir": ir,
            "all": wavy(50000.0, 0.0, days),
        }
    });
    let path = dir.path().join("series.json");
    std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();
    path
}

mod detect {
    use super::*;

    #[test]
    fn drop_reports_anomalies() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir);
        let output = dw_core(dir.path())
            .args(["detect", "--entity", "ir", "--seed", "3", "--particles", "300"])
            .args(["--taps", "1", "--top", "6"])
            .arg("--input")
            .arg(&input)
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1), "stderr: {}", String::from_utf8_lossy(&output.stderr));
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["seed"], 3);
        assert_eq!(json["report"]["entity"], "ir");
        assert_eq!(json["report"]["run"]["steps"].as_array().unwrap().len(), 30);
        assert_eq!(json["input_hash"].as_str().unwrap().len(), 64);
        let drops = json["report"]["summary"]["drops"].as_u64().unwrap();
        assert!(drops >= 1, "{}", json["report"]["summary"]);
        assert_eq!(json["report"]["classifications"][20]["event"], "drop");
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir);
        let run = || {
            let out = dw_core(dir.path())
                .args(["detect", "--entity", "de", "--seed", "9", "--particles", "100"])
                .arg("--input")
                .arg(&input)
                .output()
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
            json["report"]["run"].clone()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn unknown_entity_is_input_error() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir);
        dw_core(dir.path())
            .args(["detect", "--entity", "zz"])
            .arg("--input")
            .arg(&input)
            .assert()
            .code(12)
            .stderr(predicate::str::contains("\"code\":22"));
    }

    #[test]
    fn missing_input_is_io_error() {
        let dir = TempDir::new().unwrap();
        dw_core(dir.path())
            .args(["detect", "--entity", "de", "--input"])
            .arg(dir.path().join("missing.json"))
            .assert()
            .code(21);
    }

    #[test]
    fn bad_taps_is_config_error() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir);
        dw_core(dir.path())
            .args(["--format", "summary", "detect", "--entity", "de", "--taps", "0,7"])
            .arg("--input")
            .arg(&input)
            .assert()
            .code(11)
            .stderr(predicate::str::contains("Fix:"));
    }

    #[test]
    fn missing_entity_flag_is_args_error() {
        let dir = TempDir::new().unwrap();
        dw_core(dir.path())
            .args(["detect", "--input", "x.json"])
            .assert()
            .code(10)
            .stderr(predicate::str::contains("--entity"));
    }
}

mod model {
    use super::*;

    #[test]
    fn prints_model_table() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir);
        let output = dw_core(dir.path())
            .args(["model", "--taps", "1,7", "--seed", "1", "--top", "3"])
            .arg("--input")
            .arg(&input)
            .output()
            .unwrap();
        assert!(output.status.success());
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["model"]["reference"].as_array().unwrap().len(), 3);
        assert_eq!(json["model"]["reference"][0], "de");
        assert_eq!(json["model"]["model"]["len"], 30);
        let tap7 = json["model"]["model"]["tables"]["7"].as_array().unwrap();
        assert!(tap7[6].is_null());
        assert!(tap7[7]["std"].is_number());
    }
}

mod config {
    use super::*;

    #[test]
    fn show_defaults() {
        let dir = TempDir::new().unwrap();
        dw_core(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"particle_count\": 1000"))
            .stdout(predicate::str::contains("\"effective_hash\""));
    }

    #[test]
    fn show_preset() {
        let dir = TempDir::new().unwrap();
        dw_core(dir.path())
            .args(["config", "show", "--preset", "quick"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"particle_count\": 200"));
    }

    #[test]
    fn validate_rejects_bad_probability() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[filter]\ncensorship_prior = 1.5\n").unwrap();
        dw_core(dir.path())
            .args(["config", "validate", "--config"])
            .arg(&path)
            .assert()
            .code(11)
            .stderr(predicate::str::contains("\"code\":11"));
    }

    #[test]
    fn env_dir_is_picked_up() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("dropwatch.json"),
            r#"{"filter": {"particle_count": 77}}"#,
        )
        .unwrap();
        dw_core(dir.path())
            .env("DW_CONFIG_DIR", dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"particle_count\": 77"));
    }

    #[test]
    fn schema_is_json() {
        let dir = TempDir::new().unwrap();
        let output = dw_core(dir.path()).args(["config", "schema"]).output().unwrap();
        assert!(output.status.success());
        let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert!(schema["properties"]["filter"].is_object());
    }
}
