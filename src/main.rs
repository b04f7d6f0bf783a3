//! runway - run CI pipelines in ephemeral containers
//!
//! ## Commands
//!
//! - `runway check` - Validate a pipeline file
//! - `runway run` - Execute a pipeline file
//! - `runway completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Validate a pipeline
//! runway check pipeline.yml
//!
//! # Run it against the local Docker daemon
//! runway run pipeline.yml
//!
//! # Run it against a remote daemon and print a JSON report
//! RUNWAY_DOCKER_HOST=tcp://10.0.0.5:2375 runway run pipeline.yml --json
//!
//! # Generate shell completions
//! runway completions bash > /etc/bash_completion.d/runway
//! ```

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
