//! # runway - CI pipelines in ephemeral containers
//!
//! runway reads a declarative pipeline document (a named, ordered list of
//! jobs, each a list of shell commands) and runs every job inside its own
//! short-lived container.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use runway::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = std::fs::read("pipeline.yml")?;
//! let pipeline = Pipeline::load(&raw)?;
//!
//! let settings = Settings::from_env()?;
//! let mut runner = Runner::connect(pipeline, &settings)?;
//! let report = runner.run().await?;
//! println!("pipeline exited with {}", report.exit_code);
//! runner.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! - [`pipeline`]: document model, parsing, hydration and validation
//! - [`executor`]: container lifecycle and the step runner
//! - [`infrastructure`]: engine boundary, Docker adapter, settings, logging
//!
//! ## Guarantees
//!
//! - Steps run strictly in `steps` order, commands strictly in listed order.
//! - The first non-zero exit code stops the run and becomes its exit code.
//! - Every container that was created is removed, on every exit path.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod executor;
pub mod infrastructure;
pub mod pipeline;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use executor::{
    CancelHandle, Cancellation, Container, ContainerOptions, ContainerState, HealthStatus,
    Runner, RunnerError, cancellation,
};
pub use infrastructure::{DockerEngine, Engine, EngineError, Settings, init_logging};
pub use pipeline::{
    Cache, Job, LoadError, ParseError, Pipeline, PipelineBuilder, RunReport, RunState, Trigger,
    TriggerEvent, Validate, ValidationError, ValidationErrors,
};

/// Version of the runway crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
