//! Container lifecycle
//!
//! A [`Container`] owns one execution context for the duration of one job:
//! created idle, started on first use, executed into any number of times,
//! then closed exactly once.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use uuid::Uuid;

use super::cancel::Cancellation;
use super::console;
use crate::infrastructure::{Engine, EngineError, ExecSpec, RemoveOptions, Settings};

/// Registry path prepended to bare image names
pub const DEFAULT_REGISTRY: &str = "docker.io/library/";

/// Long-running process that keeps an idle context alive
pub const PLACEHOLDER_COMMAND: [&str; 3] = ["tail", "-f", "/dev/null"];

/// Prefix of generated context names
pub const NAME_PREFIX: &str = "runway_";

const PROBE_COMMAND: &str = "true";

/// Qualifies a bare image name with the default registry.
///
/// References that already contain a `/` are returned unchanged.
#[must_use]
pub fn canonical_image(image: &str) -> String {
    if image.contains('/') {
        image.to_string()
    } else {
        format!("{DEFAULT_REGISTRY}{image}")
    }
}

/// Lifecycle state of a [`Container`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    /// Context exists but is not running
    Created,
    /// Context is running and accepted the readiness probe
    Started,
    /// A command is in flight
    Executing,
    /// Context was removed
    Closed,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Started => write!(f, "started"),
            Self::Executing => write!(f, "executing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// How long to wait for a started context to accept commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessProbe {
    /// Probes before giving up, at least one is always made
    pub attempts: u32,
    /// Pause between probes
    pub interval: Duration,
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self {
            attempts: 20,
            interval: Duration::from_millis(250),
        }
    }
}

/// Per-container execution options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerOptions {
    /// Command prefix every script line is appended to
    pub shell: Vec<String>,
    /// Readiness probe bounds
    pub readiness: ReadinessProbe,
    /// Allocate a TTY for execs
    pub tty: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            shell: vec!["/bin/sh".to_string(), "-c".to_string()],
            readiness: ReadinessProbe::default(),
            tty: false,
        }
    }
}

impl ContainerOptions {
    /// Options from settings; TTY follows the local stdout
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            shell: settings.shell.clone(),
            readiness: ReadinessProbe {
                attempts: settings.ready_attempts,
                interval: settings.ready_interval(),
            },
            tty: console::stdout_is_terminal(),
        }
    }
}

/// One job's execution context
pub struct Container {
    engine: Arc<dyn Engine>,
    cancel: Cancellation,
    options: ContainerOptions,
    job: String,
    name: String,
    image: String,
    id: String,
    state: ContainerState,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("engine", &self.engine.name())
            .field("job", &self.job)
            .field("name", &self.name)
            .field("image", &self.image)
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Container {
    /// Pulls the job's image and creates an idle context from it.
    ///
    /// Pull progress is printed to stdout. Nothing needs closing if this
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the pull or the create fails, or
    /// [`EngineError::Cancelled`] if cancelled during the pull.
    pub async fn create(
        engine: Arc<dyn Engine>,
        cancel: Cancellation,
        options: ContainerOptions,
        job: &str,
        image: &str,
    ) -> Result<Self, EngineError> {
        let image = canonical_image(image);
        tracing::info!(job = %job, image = %image, engine = engine.name(), "Pulling image");

        let mut progress = engine.pull_image(&image);
        while let Some(message) = cancel.guard(progress.next()).await? {
            console::print_pull_progress(&message?);
        }

        let name = format!("{NAME_PREFIX}{}", Uuid::new_v4().simple());
        let placeholder: Vec<String> = PLACEHOLDER_COMMAND.iter().map(ToString::to_string).collect();
        // Never cancelled: every created context is removed by id.
        let id = engine.create_context(&name, &image, &placeholder).await?;
        tracing::debug!(job = %job, container = %name, id = %id, "Container created");

        Ok(Self {
            engine,
            cancel,
            options,
            job: job.to_string(),
            name,
            image,
            id,
            state: ContainerState::Created,
        })
    }

    /// Engine-assigned context id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Generated context name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical image reference
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ContainerState {
        self.state
    }

    /// Starts the context and waits until it accepts commands. A no-op once
    /// started.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the start fails, or
    /// [`EngineError::NotReady`] if every readiness probe fails.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        match self.state {
            ContainerState::Created => {}
            ContainerState::Started | ContainerState::Executing => return Ok(()),
            ContainerState::Closed => {
                return Err(EngineError::Start(format!("container {} is closed", self.name)));
            }
        }

        self.cancel.guard(self.engine.start_context(&self.id)).await??;
        self.wait_ready().await?;
        self.state = ContainerState::Started;

        println!(
            ">>> JOB={} CONTAINER={} CID={} IMAGE={}",
            self.job, self.name, self.id, self.image
        );
        Ok(())
    }

    async fn wait_ready(&self) -> Result<(), EngineError> {
        let probe = ExecSpec {
            cmd: self.shell_command(PROBE_COMMAND),
            env: Vec::new(),
            tty: false,
        };
        let attempts = self.options.readiness.attempts.max(1);

        for attempt in 1..=attempts {
            match self.cancel.guard(self.run_silent(&probe)).await? {
                Ok(0) => {
                    tracing::debug!(container = %self.name, attempt, "Container ready");
                    return Ok(());
                }
                Ok(code) => {
                    tracing::debug!(container = %self.name, attempt, exit_code = code, "Readiness probe failed");
                }
                Err(e) => {
                    tracing::debug!(container = %self.name, attempt, error = %e, "Readiness probe failed");
                }
            }
            if attempt < attempts {
                self.cancel
                    .guard(tokio::time::sleep(self.options.readiness.interval))
                    .await?;
            }
        }

        tracing::warn!(container = %self.name, attempts, "Container never became ready");
        Err(EngineError::NotReady { attempts })
    }

    /// Runs `command` through the configured shell with `env`, relaying its
    /// output, and returns its exit code. Starts the context first if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the engine cannot create, attach to, or
    /// inspect the exec.
    pub async fn exec(&mut self, command: &str, env: &[String]) -> Result<i64, EngineError> {
        self.start().await?;

        let spec = ExecSpec {
            cmd: self.shell_command(command),
            env: env.to_vec(),
            tty: self.options.tty,
        };
        tracing::debug!(container = %self.name, command = %command, "Executing command");

        self.state = ContainerState::Executing;
        let result = self.cancel.guard(self.run_relayed(&spec)).await;
        self.state = ContainerState::Started;
        result?
    }

    /// Force-removes the context with its volumes. Never cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Remove`] if the engine could not remove it.
    pub async fn close(mut self) -> Result<(), EngineError> {
        self.state = ContainerState::Closed;
        println!("<<<");
        let result = self
            .engine
            .remove_context(&self.id, RemoveOptions::forced())
            .await;
        match &result {
            Ok(()) => tracing::debug!(container = %self.name, "Container removed"),
            Err(e) => tracing::warn!(container = %self.name, error = %e, "Container removal failed"),
        }
        result
    }

    fn shell_command(&self, command: &str) -> Vec<String> {
        let mut cmd = self.options.shell.clone();
        cmd.push(command.to_string());
        cmd
    }

    async fn run_relayed(&self, spec: &ExecSpec) -> Result<i64, EngineError> {
        let exec_id = self.engine.exec_in_context(&self.id, spec).await?;
        let mut output = self.engine.attach(&exec_id).await?;
        while let Some(chunk) = output.next().await {
            if let Err(e) = console::relay(&chunk?) {
                tracing::warn!(container = %self.name, error = %e, "Could not relay output");
            }
        }
        self.engine.inspect_exec(&exec_id).await
    }

    async fn run_silent(&self, spec: &ExecSpec) -> Result<i64, EngineError> {
        let exec_id = self.engine.exec_in_context(&self.id, spec).await?;
        let mut output = self.engine.attach(&exec_id).await?;
        while let Some(chunk) = output.next().await {
            chunk?;
        }
        self.engine.inspect_exec(&exec_id).await
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if self.state == ContainerState::Closed {
            return;
        }
        tracing::warn!(container = %self.name, state = %self.state, "Container dropped without close");

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(container = %self.name, "No runtime to remove container, it may leak");
            return;
        };
        let engine = Arc::clone(&self.engine);
        let id = std::mem::take(&mut self.id);
        let name = std::mem::take(&mut self.name);
        runtime.spawn(async move {
            if let Err(e) = engine.remove_context(&id, RemoveOptions::forced()).await {
                tracing::warn!(container = %name, error = %e, "Background removal failed");
            }
        });
    }
}
