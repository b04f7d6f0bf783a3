//! Execution health reporting

use std::fmt;

/// Health status of the engine a runner depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Engine is answering
    Healthy,

    /// Engine is unreachable
    Unhealthy {
        /// Reason for being unhealthy
        reason: String,
    },
}

impl HealthStatus {
    /// Returns true if the runner can execute a pipeline
    #[must_use]
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::Unhealthy { .. })
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy { reason } => write!(f, "unhealthy: {reason}"),
        }
    }
}
