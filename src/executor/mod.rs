//! Pipeline execution layer
//!
//! This module turns a validated pipeline into a sequence of container
//! lifecycles on a container engine.

mod cancel;
mod console;
mod container;
mod runner;
mod traits;

pub use cancel::{CancelHandle, Cancellation, Cancelled, cancellation};
pub use console::{relay, relay_to, stdout_is_terminal};
pub use container::{
    Container, ContainerOptions, ContainerState, DEFAULT_REGISTRY, NAME_PREFIX,
    PLACEHOLDER_COMMAND, ReadinessProbe, canonical_image,
};
pub use runner::{Runner, RunnerError};
pub use traits::HealthStatus;
