//! Pipeline definition, parser and builder

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use crate::pipeline::errors::{LoadError, ParseError, ValidationError, ValidationErrors};
use crate::pipeline::job::Job;
use crate::pipeline::trigger::Trigger;
use crate::pipeline::types::Validate;
use crate::pipeline::variables::{self, Variables};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Prefix marking a top-level key as a reusable template rather than a job
pub const TEMPLATE_PREFIX: char = '.';

/// Main pipeline structure
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Triggers, written under `when`
    pub triggers: Vec<Trigger>,

    /// Job names in execution order
    pub steps: Vec<String>,

    /// Pipeline-wide variables
    pub variables: Variables,

    /// Defaults applied to every job
    pub default: Job,

    /// Jobs by name; iteration order carries no meaning
    pub jobs: HashMap<String, Job>,

    hydrated: bool,
}

/// Document shape: jobs are sibling keys of the pipeline fields.
#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    when: Option<Vec<Trigger>>,
    #[serde(default)]
    steps: Option<Vec<String>>,
    #[serde(default, deserialize_with = "variables::deserialize")]
    variables: Variables,
    #[serde(default)]
    default: Option<Job>,
    #[serde(flatten)]
    jobs: HashMap<String, Option<Job>>,
}

impl Pipeline {
    /// Parses a pipeline document.
    ///
    /// Merge keys (`<<: *anchor`) are resolved first, then every job whose
    /// name starts with `.` is dropped: those only exist to be merged into
    /// real jobs. No defaulting or validation happens here.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the bytes are not a YAML mapping of the
    /// expected shape.
    pub fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        let mut value: serde_yaml::Value = serde_yaml::from_slice(raw)?;
        if !value.is_mapping() {
            return Err(ParseError::NotAMapping);
        }
        value.apply_merge()?;

        let document: Document = serde_yaml::from_value(value)?;
        let mut jobs: HashMap<String, Job> = document
            .jobs
            .into_iter()
            .map(|(name, job)| (name, job.unwrap_or_default()))
            .collect();
        jobs.retain(|name, _| !name.starts_with(TEMPLATE_PREFIX));

        tracing::debug!(jobs = jobs.len(), "Parsed pipeline document");

        Ok(Self {
            name: document.name.unwrap_or_default(),
            triggers: document.when.unwrap_or_default(),
            steps: document.steps.unwrap_or_default(),
            variables: document.variables,
            default: document.default.unwrap_or_default(),
            jobs,
            hydrated: false,
        })
    }

    /// Applies `default` to every job. Only the first call has an effect.
    pub fn hydrate(&mut self) {
        if self.hydrated {
            return;
        }
        for job in self.jobs.values_mut() {
            *job = job.hydrate(&self.default);
        }
        self.hydrated = true;
    }

    /// Returns true once [`hydrate`](Self::hydrate) has run
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Parses, hydrates and validates a document
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Parse`] for malformed documents and
    /// [`LoadError::Validation`] with every violated rule otherwise.
    pub fn load(raw: &[u8]) -> Result<Self, LoadError> {
        let mut pipeline = Self::parse(raw)?;
        pipeline.hydrate();
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Creates a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Looks up a job by name
    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.get(name)
    }

    /// Returns number of steps
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

impl Validate for Pipeline {
    type Error = ValidationErrors;

    fn validate(&self) -> Result<(), Self::Error> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::MissingName);
        }
        if self.steps.is_empty() {
            errors.push(ValidationError::MissingSteps);
        }
        if self.triggers.is_empty() {
            errors.push(ValidationError::MissingTriggers);
        }

        for (index, trigger) in self.triggers.iter().enumerate() {
            if !trigger.event.is_known() {
                errors.push(ValidationError::UnknownTriggerEvent {
                    index,
                    event: trigger.event.to_string(),
                });
            }
        }

        for step in &self.steps {
            match self.jobs.get(step) {
                None => errors.push(ValidationError::UndefinedStep { step: step.clone() }),
                Some(job) if job.image.trim().is_empty() => {
                    errors.push(ValidationError::MissingImage { job: step.clone() });
                }
                Some(_) => {}
            }
        }

        errors.into_result()
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pipeline({}): {} steps", self.name, self.steps.len())
    }
}

/// Builder for creating pipelines in code
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    pipeline: Pipeline,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets pipeline name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.pipeline.name = name.into();
        self
    }

    /// Adds a trigger
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.pipeline.triggers.push(trigger);
        self
    }

    /// Sets a pipeline variable
    pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pipeline.variables.insert(key.into(), value.into());
        self
    }

    /// Sets the default job
    pub fn default_job(mut self, job: Job) -> Self {
        self.pipeline.default = job;
        self
    }

    /// Defines a job without scheduling it
    pub fn job(mut self, name: impl Into<String>, job: Job) -> Self {
        self.pipeline.jobs.insert(name.into(), job);
        self
    }

    /// Defines a job and appends it to the steps
    pub fn step(mut self, name: impl Into<String>, job: Job) -> Self {
        let name = name.into();
        self.pipeline.steps.push(name.clone());
        self.pipeline.jobs.insert(name, job);
        self
    }

    /// Hydrates and validates the pipeline
    #[allow(clippy::missing_errors_doc)]
    pub fn build(self) -> Result<Pipeline, ValidationErrors> {
        let mut pipeline = self.pipeline;
        pipeline.hydrate();
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Hydrates without validation (for internal use)
    #[must_use]
    pub fn build_unchecked(self) -> Pipeline {
        let mut pipeline = self.pipeline;
        pipeline.hydrate();
        pipeline
    }
}
