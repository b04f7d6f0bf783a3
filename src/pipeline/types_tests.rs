//! Tests for pipeline outcome types

use super::*;
use std::time::Duration;

fn command(exit_code: i64) -> CommandReport {
    CommandReport {
        phase: ScriptPhase::Main,
        command: "make".to_string(),
        exit_code,
        duration: Duration::from_millis(1500),
    }
}

#[test]
fn test_run_state_is_terminal() {
    assert!(!RunState::Idle.is_terminal());
    assert!(!RunState::Running.is_terminal());
    assert!(RunState::Succeeded.is_terminal());
    assert!(RunState::Failed.is_terminal());
    assert!(RunState::Errored.is_terminal());
}

#[test]
fn test_run_state_display() {
    assert_eq!(RunState::Succeeded.to_string(), "SUCCEEDED");
    assert_eq!(RunState::Failed.to_string(), "FAILED");
    assert_eq!(RunState::Errored.to_string(), "ERRORED");
}

#[test]
fn test_run_state_serialize() {
    let json = serde_json::to_string(&RunState::Failed).unwrap();
    assert_eq!(json, r#""failed""#);
}

#[test]
fn test_script_phase_display() {
    assert_eq!(ScriptPhase::Before.to_string(), "before_script");
    assert_eq!(ScriptPhase::Main.to_string(), "script");
    assert_eq!(ScriptPhase::After.to_string(), "after_script");
}

#[test]
fn test_job_report_exit_code() {
    let report = JobReport {
        name: "build".to_string(),
        image: "docker.io/library/alpine".to_string(),
        commands: vec![command(0), command(3)],
        cleanup_error: None,
    };
    assert_eq!(report.exit_code(), 3);
    assert!(!report.is_success());
}

#[test]
fn test_command_report_serializes_duration_as_millis() {
    let json = serde_json::to_value(command(0)).unwrap();
    assert_eq!(json["duration"], 1500);
    assert_eq!(json["phase"], "main");
}

#[test]
fn test_process_exit_code_is_clamped() {
    let report = RunReport {
        exit_code: 300,
        state: RunState::Failed,
        jobs: Vec::new(),
    };
    assert_eq!(report.process_exit_code(), 255);
    assert!(!report.is_success());
}

#[test]
fn test_negative_exit_code_never_reads_as_success() {
    let mut report = RunReport {
        exit_code: -1,
        state: RunState::Failed,
        jobs: Vec::new(),
    };
    assert_eq!(report.process_exit_code(), 255);

    report.exit_code = 256;
    assert_eq!(report.process_exit_code(), 255);

    report.exit_code = 42;
    assert_eq!(report.process_exit_code(), 42);
}

#[test]
fn test_job_report_omits_missing_cleanup_error() {
    let mut report = JobReport {
        name: "build".to_string(),
        image: "docker.io/library/alpine".to_string(),
        commands: Vec::new(),
        cleanup_error: None,
    };
    let json = serde_json::to_value(&report).unwrap();
    assert!(json.get("cleanup_error").is_none());
    assert_eq!(report.exit_code(), 0);

    report.cleanup_error = Some("Container remove failed: gone".to_string());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["cleanup_error"], "Container remove failed: gone");
}
