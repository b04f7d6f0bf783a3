//! `runway run` - Execute a pipeline file
//!
//! Loads the file, connects to the container engine and runs every step.
//! The process exits with the failing command's exit code, or zero.
//!
//! ## Usage
//!
//! ```bash
//! runway run <pipeline.yml> [--json]
//! ```
//!
//! Ctrl-C cancels the in-flight engine call; the open container is still
//! removed and the process exits with code 130.

use anyhow::{Context, Result};
use runway::executor::{Runner, cancellation};
use runway::infrastructure::Settings;
use runway::pipeline::{Pipeline, RunReport};
use std::path::Path;
use std::process::ExitCode;

/// Exit code after an interrupt
const INTERRUPTED: u8 = 130;

/// Runs a pipeline file to completion
///
/// # Errors
///
/// Returns an error if the file is invalid, the engine is unreachable, or
/// the engine fails during the run.
pub fn run_pipeline(file: &Path, json: bool, settings: &Settings) -> Result<ExitCode> {
    let pipeline = super::check::load_pipeline(file)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(execute(pipeline, json, settings))
}

async fn execute(pipeline: Pipeline, json: bool, settings: &Settings) -> Result<ExitCode> {
    let (handle, token) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling run");
            handle.cancel();
        }
    });

    let runner = Runner::connect(pipeline, settings)
        .context("Could not create runner")?
        .with_cancellation(token);

    match runner.execute().await {
        Ok(report) => {
            if json {
                println!("{}", render_report(&report)?);
            }
            Ok(ExitCode::from(report.process_exit_code()))
        }
        Err(e) if e.is_cancelled() => {
            eprintln!("Run cancelled: {e}");
            Ok(ExitCode::from(INTERRUPTED))
        }
        Err(e) => Err(e).context("Pipeline run failed"),
    }
}

fn render_report(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize run report")
}
