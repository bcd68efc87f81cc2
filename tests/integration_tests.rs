//! Integration tests for phasetrack
//!
//! These tests drive the binary end to end: registry loading, configuration
//! layering, and rendering of evaluated snapshots.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a phasetrack Command isolated from the caller's environment
fn phasetrack(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("phasetrack");
    cmd.current_dir(dir.path())
        .env_remove("PHASETRACK_REGISTRY")
        .env_remove("PHASETRACK_UI")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a temporary project directory
fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

fn write_registry(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(
        &path,
        r#"{
            "phases": [
                { "id": "A", "label": "Phase A" },
                { "id": "B", "label": "Phase B" },
                { "id": "C", "label": "Phase C" },
                { "id": "D", "label": "Phase D" }
            ]
        }"#,
    )
    .unwrap();
    path
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        let dir = create_temp_project();
        phasetrack(&dir).arg("--help").assert().success();
    }

    #[test]
    fn test_version() {
        let dir = create_temp_project();
        phasetrack(&dir).arg("--version").assert().success();
    }

    #[test]
    fn test_phases_lists_reference_registry() {
        let dir = create_temp_project();
        phasetrack(&dir)
            .arg("phases")
            .assert()
            .success()
            .stdout(predicate::str::contains("built-in reference pipeline"))
            .stdout(predicate::str::contains("detecting_pages"))
            .stdout(predicate::str::contains("interpreting"))
            .stdout(predicate::str::contains("4 phases"));
    }

    #[test]
    fn test_phases_with_custom_registry() {
        let dir = create_temp_project();
        let registry = write_registry(&dir, "registry.json");
        phasetrack(&dir)
            .arg("--registry")
            .arg(&registry)
            .arg("phases")
            .assert()
            .success()
            .stdout(predicate::str::contains("Phase C"))
            .stdout(predicate::str::contains("detecting_pages").not());
    }

    #[test]
    fn test_invalid_registry_fails() {
        let dir = create_temp_project();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{ "phases": [ {"id":"x","label":"X"}, {"id":"x","label":"Y"} ] }"#)
            .unwrap();
        phasetrack(&dir)
            .arg("--registry")
            .arg(&path)
            .arg("phases")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Duplicate phase id"));
    }

    #[test]
    fn test_missing_cli_registry_fails() {
        let dir = create_temp_project();
        phasetrack(&dir)
            .args(["--registry", "typo.json", "status", "--phase", "B"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load phase registry"))
            .stderr(predicate::str::contains("typo.json"));
    }

    #[test]
    fn test_missing_env_registry_fails() {
        let dir = create_temp_project();
        phasetrack(&dir)
            .env("PHASETRACK_REGISTRY", "typo.json")
            .arg("phases")
            .assert()
            .failure()
            .stderr(predicate::str::contains("typo.json"));
    }
}

// =============================================================================
// One-shot Evaluation
// =============================================================================

mod status {
    use super::*;

    #[test]
    fn test_status_minimal_running_with_progress() {
        let dir = create_temp_project();
        let registry = write_registry(&dir, "registry.json");
        phasetrack(&dir)
            .args(["--ui", "minimal", "--registry"])
            .arg(&registry)
            .args(["status", "--phase", "B", "--progress", "0.5"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "37.5% B | A=completed B=running C=pending D=pending",
            ));
    }

    #[test]
    fn test_status_completed_is_100() {
        let dir = create_temp_project();
        phasetrack(&dir)
            .args(["--ui", "minimal", "status", "--phase", "completed", "--progress", "0.3"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("100% completed"))
            .stdout(predicate::str::contains("pending").not());
    }

    #[test]
    fn test_status_unrecognized_phase() {
        let dir = create_temp_project();
        phasetrack(&dir)
            .args(["--ui", "minimal", "status", "--phase", "bogus_phase"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("0% bogus_phase"))
            .stdout(predicate::str::contains("running").not())
            .stdout(predicate::str::contains("completed").not());
    }

    #[test]
    fn test_status_failed_phase_reports_zero() {
        let dir = create_temp_project();
        let registry = write_registry(&dir, "registry.json");
        phasetrack(&dir)
            .args(["--ui", "minimal", "--registry"])
            .arg(&registry)
            .args(["status", "--phase", "failed", "--failed-phase", "B"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "0% failed | A=completed B=failed C=pending D=pending",
            ));
    }

    #[test]
    fn test_status_sub_stage_json() {
        let dir = create_temp_project();
        let output = phasetrack(&dir)
            .args(["--ui", "json", "status", "--phase", "interpreting", "--stage", "6"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let value: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("stdout is one JSON object");
        assert_eq!(value["overallPercent"], 75.0);
        assert_eq!(value["subStage"]["percent"], 50.0);
        assert_eq!(value["statuses"][3]["status"], "running");
    }

    #[test]
    fn test_status_negative_progress_is_accepted() {
        let dir = create_temp_project();
        phasetrack(&dir)
            .args([
                "--ui",
                "minimal",
                "status",
                "--phase",
                "detecting_pages",
                "--progress",
                "-0.5",
            ])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("0% detecting_pages"));
    }

    #[test]
    fn test_status_full_mode_prints_summary() {
        let dir = create_temp_project();
        phasetrack(&dir)
            .args(["status", "--phase", "completed"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Overall"))
            .stdout(predicate::str::contains("Interpreting"))
            .stdout(predicate::str::contains("Pipeline"));
    }

    #[test]
    fn test_eval_reads_snapshot_file() {
        let dir = create_temp_project();
        let snapshot = dir.path().join("snapshot.json");
        fs::write(
            &snapshot,
            r#"{"currentPhase":"extracting","phaseProgress":{"phase":"extracting","progress":0.5}}"#,
        )
        .unwrap();

        phasetrack(&dir)
            .args(["--ui", "minimal", "eval"])
            .arg(&snapshot)
            .assert()
            .success()
            .stdout(predicate::str::starts_with("37.5% extracting"));
    }

    #[test]
    fn test_eval_reads_stdin() {
        let dir = create_temp_project();
        phasetrack(&dir)
            .args(["--ui", "minimal", "eval"])
            .write_stdin(r#"{"currentPhase":"analyzing_merges"}"#)
            .assert()
            .success()
            .stdout(predicate::str::starts_with("50% analyzing_merges"));
    }

    #[test]
    fn test_eval_malformed_snapshot_fails() {
        let dir = create_temp_project();
        phasetrack(&dir)
            .args(["eval"])
            .write_stdin("{ not json")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to parse snapshot JSON"));
    }
}

// =============================================================================
// Streaming
// =============================================================================

mod watch {
    use super::*;

    #[test]
    fn test_watch_renders_every_snapshot() {
        let dir = create_temp_project();
        let input = concat!(
            "{\"currentPhase\":\"detecting_pages\"}\n",
            "{\"currentPhase\":\"extracting\",\"phaseProgress\":{\"phase\":\"extracting\",\"progress\":0.5}}\n",
            "{\"currentPhase\":\"interpreting\",\"interpretationStage\":6}\n",
            "{\"currentPhase\":\"completed\"}\n",
        );
        let output = phasetrack(&dir)
            .args(["--ui", "minimal", "watch"])
            .write_stdin(input)
            .output()
            .unwrap();
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).unwrap();
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("0% detecting_pages"));
        assert!(lines[1].starts_with("37.5% extracting"));
        assert!(lines[2].ends_with("Stage 6 of 12 (50%)"));
        assert!(lines[3].starts_with("100% completed"));
    }

    #[test]
    fn test_watch_skips_malformed_lines() {
        let dir = create_temp_project();
        let input = "{\"currentPhase\":\"extracting\"}\ngarbage\n{\"currentPhase\":\"completed\"}\n";
        phasetrack(&dir)
            .args(["--ui", "minimal", "watch"])
            .write_stdin(input)
            .assert()
            .success()
            .stdout(predicate::str::contains("25% extracting"))
            .stdout(predicate::str::contains("100% completed"))
            .stderr(predicate::str::contains("skipping malformed snapshot"));
    }

    #[test]
    fn test_watch_until_done_stops_at_terminal_snapshot() {
        let dir = create_temp_project();
        let stream = dir.path().join("stream.jsonl");
        fs::write(
            &stream,
            "{\"currentPhase\":\"extracting\"}\n{\"currentPhase\":\"failed\",\"failedPhase\":\"extracting\"}\n{\"currentPhase\":\"interpreting\"}\n",
        )
        .unwrap();

        let output = phasetrack(&dir)
            .args(["--ui", "minimal", "watch", "--until-done"])
            .arg(&stream)
            .output()
            .unwrap();
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).unwrap();
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("extracting=failed"));
    }

    #[test]
    fn test_watch_until_done_exits_while_stdin_stays_open() {
        use std::io::Write;
        use std::process::{Command as StdCommand, Stdio};
        use std::time::{Duration, Instant};

        let dir = create_temp_project();
        let mut child = StdCommand::new(env!("CARGO_BIN_EXE_phasetrack"))
            .current_dir(dir.path())
            .env_remove("PHASETRACK_REGISTRY")
            .env_remove("PHASETRACK_UI")
            .env_remove("RUST_LOG")
            .args(["--ui", "minimal", "watch", "--until-done"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        // Keep the write end open for the whole test.
        let mut stdin = child.stdin.take().unwrap();
        stdin.write_all(b"{\"currentPhase\":\"completed\"}\n").unwrap();
        stdin.flush().unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let status = loop {
            if let Some(status) = child.try_wait().unwrap() {
                break Some(status);
            }
            if Instant::now() >= deadline {
                break None;
            }
            std::thread::sleep(Duration::from_millis(50));
        };

        if status.is_none() {
            child.kill().ok();
            child.wait().ok();
        }
        drop(stdin);

        let status = status.expect("watch --until-done did not exit with stdin open");
        assert!(status.success());
    }

    #[test]
    fn test_watch_json_lines() {
        let dir = create_temp_project();
        let output = phasetrack(&dir)
            .args(["--ui", "json", "watch"])
            .write_stdin("{\"currentPhase\":\"extracting\"}\n{\"currentPhase\":\"completed\"}\n")
            .output()
            .unwrap();
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).unwrap();
        let reports: Vec<serde_json::Value> = stdout
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0]["overallPercent"], 25.0);
        assert_eq!(reports[1]["overallPercent"], 100.0);
    }

    #[test]
    fn test_watch_missing_file_fails() {
        let dir = create_temp_project();
        phasetrack(&dir)
            .args(["watch", "does-not-exist.jsonl"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to open snapshot stream"));
    }
}

// =============================================================================
// Configuration
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_init_creates_file() {
        let dir = create_temp_project();
        phasetrack(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created tracker.toml"));

        assert!(dir.path().join(".phasetrack/tracker.toml").exists());

        phasetrack(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_config_show_defaults() {
        let dir = create_temp_project();
        phasetrack(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No tracker.toml found"))
            .stdout(predicate::str::contains("failed_progress = \"reset\""));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".phasetrack")).unwrap();
        fs::write(
            dir.path().join(".phasetrack/tracker.toml"),
            "[registry]\npath = \"missing.json\"\n\n[display]\nui = \"fancy\"\n",
        )
        .unwrap();

        phasetrack(&dir)
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration warnings"))
            .stdout(predicate::str::contains("fancy"))
            .stdout(predicate::str::contains("does not exist"));
    }

    #[test]
    fn test_config_file_drives_registry_and_failure_policy() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".phasetrack")).unwrap();
        write_registry(&dir, ".phasetrack/registry.json");
        fs::write(
            dir.path().join(".phasetrack/tracker.toml"),
            "[registry]\npath = \"registry.json\"\n\n[progress]\nfailed_progress = \"hold\"\n\n[display]\nui = \"minimal\"\n",
        )
        .unwrap();

        phasetrack(&dir)
            .args(["status", "--phase", "failed", "--failed-phase", "C"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "50% failed | A=completed B=completed C=failed D=pending",
            ));
    }

    #[test]
    fn test_env_ui_override() {
        let dir = create_temp_project();
        phasetrack(&dir)
            .env("PHASETRACK_UI", "minimal")
            .args(["status", "--phase", "extracting"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("25% extracting"));
    }

    #[test]
    fn test_empty_env_ui_keeps_file_setting() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".phasetrack")).unwrap();
        fs::write(
            dir.path().join(".phasetrack/tracker.toml"),
            "[display]\nui = \"minimal\"\n",
        )
        .unwrap();
        phasetrack(&dir)
            .env("PHASETRACK_UI", "")
            .args(["status", "--phase", "extracting"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("25% extracting"));
    }
}
