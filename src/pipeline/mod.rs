//! Pipeline domain types and logic
//!
//! A pipeline document goes through three stages before anything runs:
//! [`Pipeline::parse`], [`Pipeline::hydrate`] and [`Validate::validate`].
//! [`Pipeline::load`] chains all three.

pub mod errors;
pub mod job;
pub mod pipeline_def;
pub mod trigger;
pub mod types;
pub mod variables;

#[cfg(test)]
mod types_tests;

pub use errors::{LoadError, ParseError, ValidationError, ValidationErrors};
pub use job::{Cache, Job};
pub use pipeline_def::{Pipeline, PipelineBuilder, TEMPLATE_PREFIX};
pub use trigger::{Trigger, TriggerEvent};
pub use types::{CommandReport, JobReport, RunReport, RunState, ScriptPhase, Validate};
pub use variables::{Variables, merge_environment, to_env_list};
