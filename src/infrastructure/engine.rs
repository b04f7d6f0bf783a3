//! Container engine boundary
//!
//! Everything the executor needs from a container runtime goes through
//! [`Engine`]. Implementations translate these calls to a concrete runtime;
//! the executor never talks to one directly.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;
use thiserror::Error;

/// Errors reported by a container engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine endpoint could not be reached
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Image pull failed
    #[error("Image pull failed for '{image}': {reason}")]
    Pull {
        /// Image reference being pulled.
        image: String,
        /// Engine-provided reason.
        reason: String,
    },

    /// Execution context could not be created
    #[error("Container creation failed: {0}")]
    Create(String),

    /// Execution context could not be started
    #[error("Container start failed: {0}")]
    Start(String),

    /// Exec could not be created
    #[error("Exec creation failed: {0}")]
    Exec(String),

    /// Exec output could not be attached or read
    #[error("Exec attach failed: {0}")]
    Attach(String),

    /// Exec result could not be inspected
    #[error("Exec inspect failed: {0}")]
    Inspect(String),

    /// Execution context could not be removed
    #[error("Container remove failed: {0}")]
    Remove(String),

    /// The context never accepted commands
    #[error("Container did not become ready after {attempts} probes")]
    NotReady {
        /// Probes attempted.
        attempts: u32,
    },

    /// The run was cancelled while the call was in flight
    #[error("Operation cancelled")]
    Cancelled,
}

/// One progress message from an image pull
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PullProgress {
    /// Layer or image id the message refers to
    pub id: Option<String>,
    /// Status text, e.g. `Downloading`
    pub status: String,
    /// Pre-rendered progress bar, if any
    pub progress: Option<String>,
}

impl fmt::Display for PullProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = &self.id {
            write!(f, "{id}: ")?;
        }
        f.write_str(&self.status)?;
        if let Some(progress) = &self.progress {
            write!(f, " {progress}")?;
        }
        Ok(())
    }
}

/// A chunk of exec output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutput {
    /// Demultiplexed standard output
    Stdout(Vec<u8>),
    /// Demultiplexed standard error
    Stderr(Vec<u8>),
    /// Combined stream of a TTY exec
    Console(Vec<u8>),
}

/// A command to execute inside a running context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecSpec {
    /// Argument vector, not a shell string
    pub cmd: Vec<String>,
    /// `KEY=VALUE` entries
    pub env: Vec<String>,
    /// Allocate a TTY (combined output)
    pub tty: bool,
}

/// How a context is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoveOptions {
    /// Also remove anonymous volumes
    pub volumes: bool,
    /// Kill the context if it is running
    pub force: bool,
}

impl RemoveOptions {
    /// Kill and remove with volumes
    #[must_use]
    pub fn forced() -> Self {
        Self {
            volumes: true,
            force: true,
        }
    }
}

/// Stream of pull progress messages
pub type PullStream = BoxStream<'static, Result<PullProgress, EngineError>>;

/// Stream of exec output chunks; ends when the exec finishes
pub type OutputStream = BoxStream<'static, Result<ExecOutput, EngineError>>;

/// Capabilities a container runtime provides to the executor
#[async_trait]
pub trait Engine: Send + Sync {
    /// Short runtime name for logs
    fn name(&self) -> &'static str;

    /// Checks that the engine answers
    async fn ping(&self) -> Result<(), EngineError>;

    /// Pulls `reference`, yielding progress until done
    fn pull_image(&self, reference: &str) -> PullStream;

    /// Creates an idle context named `name` running `placeholder`; returns its id
    async fn create_context(
        &self,
        name: &str,
        image: &str,
        placeholder: &[String],
    ) -> Result<String, EngineError>;

    /// Starts a created context
    async fn start_context(&self, id: &str) -> Result<(), EngineError>;

    /// Creates an exec in context `id`; returns the exec id
    async fn exec_in_context(&self, id: &str, spec: &ExecSpec) -> Result<String, EngineError>;

    /// Starts the exec and attaches to its output. An exec created with
    /// [`ExecSpec::tty`] yields [`ExecOutput::Console`] chunks.
    async fn attach(&self, exec_id: &str) -> Result<OutputStream, EngineError>;

    /// Exit code of a finished exec
    async fn inspect_exec(&self, exec_id: &str) -> Result<i64, EngineError>;

    /// Removes context `id`
    async fn remove_context(&self, id: &str, options: RemoveOptions) -> Result<(), EngineError>;
}
