//! Infrastructure layer
//!
//! This module contains the container engine boundary, its Docker adapter,
//! runtime settings and logging.

mod config;
pub mod docker;
pub mod engine;
mod logging;

#[cfg(test)]
pub(crate) mod simulated;

pub use config::{
    ConfigError, ENV_DOCKER_HOST, ENV_ENGINE_TIMEOUT_SECS, ENV_LOG, ENV_READY_ATTEMPTS,
    ENV_READY_INTERVAL_MS, ENV_SHELL, Settings,
};
pub use docker::DockerEngine;
pub use engine::{
    Engine, EngineError, ExecOutput, ExecSpec, OutputStream, PullProgress, PullStream,
    RemoveOptions,
};
pub use logging::init_logging;
