//! Prelude module for common imports

// Re-export all pipeline types with full paths
pub use crate::pipeline::errors::{LoadError, ParseError, ValidationError, ValidationErrors};
pub use crate::pipeline::job::{Cache, Job};
pub use crate::pipeline::pipeline_def::{Pipeline, PipelineBuilder};
pub use crate::pipeline::trigger::{Trigger, TriggerEvent};
pub use crate::pipeline::types::{
    CommandReport, JobReport, RunReport, RunState, ScriptPhase, Validate,
};
pub use crate::pipeline::variables::Variables;

// Re-export executor types
pub use crate::executor::{
    CancelHandle, Cancellation, ContainerOptions, HealthStatus, ReadinessProbe, Runner,
    RunnerError, cancellation,
};

// Re-export infrastructure types
pub use crate::infrastructure::{Engine, EngineError, Settings};
