//! Core types for pipeline domain
//!
//! Outcome types shared by the runner and the command-line surface.

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// State of a pipeline run as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Nothing has been executed yet
    Idle,
    /// Steps are being executed
    Running,
    /// Every command of every step exited zero
    Succeeded,
    /// A command exited non-zero
    Failed,
    /// The engine failed a requested operation
    Errored,
}

impl RunState {
    /// Returns true once the run can no longer change state
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Errored)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Running => write!(f, "RUNNING"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Errored => write!(f, "ERRORED"),
        }
    }
}

/// Which script list a command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPhase {
    /// `before_script`
    Before,
    /// `script`
    Main,
    /// `after_script`
    After,
}

impl fmt::Display for ScriptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before_script"),
            Self::Main => write!(f, "script"),
            Self::After => write!(f, "after_script"),
        }
    }
}

/// Result of one command executed inside a job's container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReport {
    /// Script list the command belongs to
    pub phase: ScriptPhase,
    /// The command as written in the document
    pub command: String,
    /// Exit code reported by the engine
    pub exit_code: i64,
    /// Wall-clock time spent on the command
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    /// Step (job) name
    pub name: String,
    /// Canonical image the job ran in
    pub image: String,
    /// Commands run, in execution order
    pub commands: Vec<CommandReport>,
    /// Why the container could not be removed, if it could not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_error: Option<String>,
}

impl JobReport {
    /// Exit code of the last command, zero if none ran
    #[must_use]
    pub fn exit_code(&self) -> i64 {
        self.commands.last().map_or(0, |c| c.exit_code)
    }

    /// Returns true if every command exited zero
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.commands.iter().all(|c| c.exit_code == 0)
    }
}

/// Final outcome of a run that did not hit an engine error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Pipeline exit code: zero on success, the failing command's code otherwise
    pub exit_code: i64,
    /// Terminal state reached
    pub state: RunState,
    /// Steps that were started, in execution order
    pub jobs: Vec<JobReport>,
}

impl RunReport {
    /// Returns true if the pipeline succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == RunState::Succeeded
    }

    /// Exit code in the range a process can return. A non-zero code outside
    /// `1..=255` maps to 255, so a failure never reads as success.
    #[must_use]
    pub fn process_exit_code(&self) -> u8 {
        match self.exit_code {
            0 => 0,
            code => u8::try_from(code).unwrap_or(u8::MAX),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Trait for types that can be validated
#[allow(clippy::missing_errors_doc)]
pub trait Validate {
    /// Type of validation error
    type Error;

    /// Validates this type
    fn validate(&self) -> std::result::Result<(), Self::Error>;
}
