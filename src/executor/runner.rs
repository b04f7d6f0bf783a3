//! Pipeline runner
//!
//! Drives a validated [`Pipeline`] step by step. Each step gets its own
//! [`Container`], which is closed before the next step starts or the run
//! returns. The first non-zero exit code stops the run.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use super::cancel::Cancellation;
use super::container::{Container, ContainerOptions};
use super::traits::HealthStatus;
use crate::infrastructure::{DockerEngine, Engine, EngineError, Settings};
use crate::pipeline::{
    CommandReport, Job, JobReport, Pipeline, RunReport, RunState, merge_environment, to_env_list,
};

/// Errors that abort a run
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The engine failed while running a job
    #[error("Job '{job}' aborted: {source}")]
    Engine {
        /// Job being run
        job: String,
        /// Engine failure
        #[source]
        source: EngineError,
    },

    /// A step names no job
    #[error("Step '{0}' is not defined as a job")]
    UnknownJob(String),

    /// The engine client could not be set up
    #[error("Cannot connect to container engine: {0}")]
    Connect(#[source] EngineError),

    /// The engine failed its health check
    #[error("Container engine is unhealthy: {0}")]
    Unhealthy(String),
}

impl RunnerError {
    /// Engine failure behind this error, if any
    #[must_use]
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Self::Engine { source, .. } | Self::Connect(source) => Some(source),
            Self::UnknownJob(_) | Self::Unhealthy(_) => None,
        }
    }

    /// Returns true if the run was interrupted
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.engine_error(), Some(EngineError::Cancelled))
    }
}

/// Runs a pipeline's steps inside containers
pub struct Runner {
    engine: Arc<dyn Engine>,
    pipeline: Pipeline,
    options: ContainerOptions,
    cancel: Cancellation,
    state: RunState,
}

impl Runner {
    /// Creates a runner over `engine`. The pipeline is hydrated if it was
    /// not already.
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, mut pipeline: Pipeline) -> Self {
        pipeline.hydrate();
        Self {
            engine,
            pipeline,
            options: ContainerOptions::default(),
            cancel: Cancellation::never(),
            state: RunState::Idle,
        }
    }

    /// Creates a runner backed by the Docker engine described by `settings`
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Connect`] if the client cannot be built.
    pub fn connect(pipeline: Pipeline, settings: &Settings) -> Result<Self, RunnerError> {
        let engine = DockerEngine::connect(settings.docker_host.as_deref(), settings.engine_timeout())
            .map_err(RunnerError::Connect)?;
        Ok(Self::new(Arc::new(engine), pipeline).with_options(ContainerOptions::from_settings(settings)))
    }

    /// Sets container options
    #[must_use]
    pub fn with_options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the cancellation token raced against every engine call
    #[must_use]
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    /// Current run state
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Pipeline being run
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Checks that the engine answers
    pub async fn health_check(&self) -> HealthStatus {
        match self.engine.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy {
                reason: e.to_string(),
            },
        }
    }

    /// Runs every step in order.
    ///
    /// A script failure is a normal outcome: the report carries the failing
    /// exit code with [`RunState::Failed`]. Container removal failures are
    /// recorded on the job report and never change the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the engine fails or a step names no job.
    /// The open container is closed before the error is returned.
    pub async fn run(&mut self) -> Result<RunReport, RunnerError> {
        self.state = RunState::Running;
        tracing::info!(
            pipeline = %self.pipeline.name,
            steps = self.pipeline.step_count(),
            engine = self.engine.name(),
            "Starting pipeline run"
        );
        let start = Instant::now();

        let result = self.execute_steps().await;
        let duration = start.elapsed();

        match &result {
            Ok(report) => {
                self.state = report.state;
                tracing::info!(
                    pipeline = %self.pipeline.name,
                    state = %report.state,
                    exit_code = report.exit_code,
                    duration_ms = duration.as_millis(),
                    "Pipeline finished"
                );
            }
            Err(e) => {
                self.state = RunState::Errored;
                tracing::error!(pipeline = %self.pipeline.name, error = %e, "Pipeline errored");
            }
        }
        result
    }

    /// Checks the engine, runs every step, then closes the runner whatever
    /// the outcome. The health check is raced against cancellation too.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Unhealthy`] if the engine does not answer, and
    /// otherwise whatever [`run`](Self::run) returns.
    pub async fn execute(mut self) -> Result<RunReport, RunnerError> {
        let health = self.cancel.guard(self.health_check()).await;
        let outcome = match health {
            Err(cancelled) => Err(RunnerError::Connect(cancelled.into())),
            Ok(HealthStatus::Unhealthy { reason }) => {
                tracing::error!(engine = self.engine.name(), reason = %reason, "Engine health check failed");
                Err(RunnerError::Unhealthy(reason))
            }
            Ok(HealthStatus::Healthy) => self.run().await,
        };

        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "Failed to release container engine");
        }
        outcome
    }

    /// Releases the engine handle
    #[allow(clippy::missing_errors_doc, clippy::unnecessary_wraps)]
    pub fn close(self) -> Result<(), RunnerError> {
        tracing::debug!(engine = self.engine.name(), "Releasing engine");
        drop(self.engine);
        Ok(())
    }

    async fn execute_steps(&self) -> Result<RunReport, RunnerError> {
        let steps = self
            .pipeline
            .steps
            .iter()
            .map(|step| {
                self.pipeline
                    .job(step)
                    .map(|job| (step, job))
                    .ok_or_else(|| RunnerError::UnknownJob(step.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut jobs = Vec::with_capacity(steps.len());

        for (step, job) in steps {
            tracing::info!(job = %step, image = %job.image, "Running job");
            let report = self
                .run_job(step, job)
                .await
                .map_err(|source| RunnerError::Engine {
                    job: step.clone(),
                    source,
                })?;

            let exit_code = report.exit_code();
            jobs.push(report);
            if exit_code != 0 {
                tracing::error!(job = %step, exit_code, "Job failed, stopping pipeline");
                return Ok(RunReport {
                    exit_code,
                    state: RunState::Failed,
                    jobs,
                });
            }
        }

        Ok(RunReport {
            exit_code: 0,
            state: RunState::Succeeded,
            jobs,
        })
    }

    /// Acquires the job's container, runs its scripts, and always releases
    /// the container before returning.
    async fn run_job(&self, name: &str, job: &Job) -> Result<JobReport, EngineError> {
        let env = to_env_list(&merge_environment(&self.pipeline.variables, &job.variables));

        let mut container = Container::create(
            Arc::clone(&self.engine),
            self.cancel.clone(),
            self.options.clone(),
            name,
            &job.image,
        )
        .await?;
        let image = container.image().to_string();

        let outcome = self.run_scripts(&mut container, job, &env).await;

        let cleanup_error = match container.close().await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(job = %name, error = %e, "Container cleanup failed");
                Some(e.to_string())
            }
        };

        Ok(JobReport {
            name: name.to_string(),
            image,
            commands: outcome?,
            cleanup_error,
        })
    }

    async fn run_scripts(
        &self,
        container: &mut Container,
        job: &Job,
        env: &[String],
    ) -> Result<Vec<CommandReport>, EngineError> {
        let mut reports = Vec::with_capacity(job.command_count());

        for (phase, command) in job.commands() {
            let start = Instant::now();
            let exit_code = container.exec(command, env).await?;
            let duration = start.elapsed();

            tracing::debug!(
                container = %container.name(),
                phase = %phase,
                exit_code,
                duration_ms = duration.as_millis(),
                "Command finished"
            );
            reports.push(CommandReport {
                phase,
                command: command.to_string(),
                exit_code,
                duration,
            });

            if exit_code != 0 {
                eprintln!("non-zero exit status from command: {command}");
                break;
            }
        }
        Ok(reports)
    }
}
