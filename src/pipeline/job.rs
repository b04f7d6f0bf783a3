//! Job and cache definitions
//!
//! A job is an image plus three ordered command lists. Jobs start out sparse
//! and are completed from the pipeline's `default` job by [`Job::hydrate`].

use crate::pipeline::types::ScriptPhase;
use crate::pipeline::variables::{self, Variables};
use serde::{Deserialize, Serialize};

/// Cache descriptor for a job.
///
/// Modeled and hydrated, but no runner consults it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Cache {
    /// Cache key
    pub key: String,
    /// Files whose content keys the cache
    pub files: Vec<String>,
    /// Paths to persist
    pub paths: Vec<String>,
}

impl Cache {
    /// True iff key, files and paths are all empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.files.is_empty() && self.paths.is_empty()
    }
}

/// A named unit of work
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    /// Image reference the job runs in
    pub image: String,

    /// Commands run before `script`
    pub before_script: Vec<String>,

    /// Main commands
    pub script: Vec<String>,

    /// Commands run after `script`
    pub after_script: Vec<String>,

    /// Job-level variables, overriding pipeline variables
    #[serde(deserialize_with = "variables::deserialize")]
    pub variables: Variables,

    /// Cache descriptor
    #[serde(skip_serializing_if = "Cache::is_empty")]
    pub cache: Cache,
}

impl Job {
    /// Creates a job running in `image`
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }

    /// Sets the main commands
    #[must_use]
    pub fn with_script<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Sets a job variable
    #[must_use]
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Fills every empty field from `default`.
    ///
    /// Each field is taken wholesale: a job that sets `script` keeps its own
    /// script even if other fields come from the default. `cache` counts as
    /// one field.
    #[must_use]
    pub fn hydrate(&self, default: &Job) -> Job {
        let mut job = self.clone();
        if job.image.is_empty() && !default.image.is_empty() {
            job.image.clone_from(&default.image);
        }
        if job.before_script.is_empty() && !default.before_script.is_empty() {
            job.before_script.clone_from(&default.before_script);
        }
        if job.script.is_empty() && !default.script.is_empty() {
            job.script.clone_from(&default.script);
        }
        if job.after_script.is_empty() && !default.after_script.is_empty() {
            job.after_script.clone_from(&default.after_script);
        }
        if job.variables.is_empty() && !default.variables.is_empty() {
            job.variables.clone_from(&default.variables);
        }
        if job.cache.is_empty() && !default.cache.is_empty() {
            job.cache = default.cache.clone();
        }
        job
    }

    /// All commands in execution order, tagged with their script list
    pub fn commands(&self) -> impl Iterator<Item = (ScriptPhase, &str)> {
        tagged(ScriptPhase::Before, &self.before_script)
            .chain(tagged(ScriptPhase::Main, &self.script))
            .chain(tagged(ScriptPhase::After, &self.after_script))
    }

    /// Total number of commands across the three script lists
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.before_script.len() + self.script.len() + self.after_script.len()
    }
}

fn tagged(phase: ScriptPhase, list: &[String]) -> impl Iterator<Item = (ScriptPhase, &str)> {
    list.iter().map(move |c| (phase, c.as_str()))
}
