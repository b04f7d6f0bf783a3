//! `runway check` - Validate a pipeline file
//!
//! Parses, hydrates and validates the file without touching a container
//! engine. Every violated rule is reported at once.
//!
//! ## Usage
//!
//! ```bash
//! runway check <pipeline.yml>
//! # Exit code 0: pipeline is valid
//! # Exit code 1: file unreadable, malformed or invalid
//! ```

use anyhow::{Context, Result};
use runway::pipeline::Pipeline;
use std::fs;
use std::path::Path;

/// Reads and loads a pipeline file
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load_pipeline(file: &Path) -> Result<Pipeline> {
    let raw =
        fs::read(file).with_context(|| format!("Could not open file: {}", file.display()))?;

    tracing::debug!(file = %file.display(), bytes = raw.len(), "Loading pipeline");

    Pipeline::load(&raw).with_context(|| format!("Pipeline file {} is not valid", file.display()))
}

/// One-line description of a loaded pipeline
pub fn summary(pipeline: &Pipeline) -> String {
    let triggers: Vec<String> = pipeline.triggers.iter().map(ToString::to_string).collect();
    format!(
        "{}: runs {} {}",
        pipeline,
        pipeline.steps.join(" -> "),
        triggers.join(", ")
    )
}

/// Validates a pipeline file and prints its summary
///
/// # Errors
///
/// Returns an error if the file cannot be loaded.
pub fn check_pipeline(file: &Path) -> Result<()> {
    let pipeline = load_pipeline(file)?;
    println!("{}", summary(&pipeline));
    tracing::info!(file = %file.display(), "Pipeline is valid");
    Ok(())
}
