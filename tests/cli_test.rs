//! Integration tests for the archscore binary
//!
//! Each test writes a manifest (and optionally a config) into its own temp
//! directory and runs the real binary against it.

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const CYCLE_MANIFEST: &str = r#"{
  "modules": [
    { "path": "src/ui/page.ts", "imports": ["src/domain/user.ts"], "line_count": 120 },
    { "path": "src/domain/user.ts",
      "imports": ["src/domain/repo.ts", "src/ui/page.ts"], "line_count": 80 },
    { "path": "src/domain/repo.ts", "imports": ["src/domain/user.ts", "lodash"], "line_count": 60 }
  ]
}"#;

fn workspace(manifest: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("modules.json"), manifest).expect("Failed to write manifest");
    dir
}

/// Run archscore and return (stdout, stderr, exit code)
fn run(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_archscore"))
        .arg(dir.join("modules.json"))
        .args(args)
        .env_remove("ARCHSCORE_CONFIG")
        .output()
        .expect("Failed to run archscore");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn test_outputs_json_result() {
    let dir = workspace(CYCLE_MANIFEST);
    let (stdout, stderr, code) = run(dir.path(), &[]);
    assert_eq!(code, 0, "stderr: {}", stderr);

    let json: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is not JSON");
    assert_eq!(json["total_modules"], 3);
    assert_eq!(json["total_loc"], 260);
    assert_eq!(json["counts"]["critical"], 1);
    assert_eq!(json["violations"][0]["rule"], "circular-dependency");
}

#[test]
fn test_project_config_is_picked_up() {
    let dir = workspace(CYCLE_MANIFEST);
    std::fs::write(
        dir.path().join("archscore.toml"),
        "[layer_rules]\nui = [\"domain\"]\ndomain = []\n",
    )
    .unwrap();

    let (stdout, stderr, code) = run(dir.path(), &["--pretty"]);
    assert_eq!(code, 0, "stderr: {}", stderr);

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let rules: Vec<&str> = json["violations"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["rule"].as_str())
        .collect();
    assert!(rules.contains(&"layer-violation"));
}

#[test]
fn test_top_flag() {
    let dir = workspace(CYCLE_MANIFEST);
    let (stdout, _, code) = run(dir.path(), &["--top", "0", "--sequential"]);
    assert_eq!(code, 0);

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["top_risks"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_missing_manifest_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run(dir.path(), &[]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Failed to load manifest"));
}

#[test]
fn test_bad_config_fails() {
    let dir = workspace(CYCLE_MANIFEST);
    let config = dir.path().join("custom.yaml");
    std::fs::write(&config, "top_n: 3").unwrap();

    let (_, stderr, code) = run(dir.path(), &["--config", config.to_str().unwrap()]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Failed to load config"));
}
