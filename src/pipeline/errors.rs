//! Error types for pipeline domain

use std::fmt;
use thiserror::Error;

/// Errors raised while turning raw document bytes into a [`Pipeline`](super::Pipeline)
#[derive(Error, Debug)]
pub enum ParseError {
    /// The document is not well-formed YAML or does not fit the schema shape
    #[error("Pipeline document is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document root is something other than a mapping
    #[error("Pipeline document must be a mapping at the top level")]
    NotAMapping,
}

/// A single violated rule found while validating a pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `name` is missing or empty
    #[error("Pipeline name cannot be empty")]
    MissingName,

    /// `steps` is missing or empty
    #[error("Pipeline must declare at least one step")]
    MissingSteps,

    /// `when` is missing or empty
    #[error("Pipeline must declare at least one trigger under 'when'")]
    MissingTriggers,

    /// A trigger uses an event outside the supported set
    #[error("Trigger #{index} has unknown event '{event}' (expected one of push, merge_request, tag, manual)")]
    UnknownTriggerEvent {
        /// Position of the trigger under `when`.
        index: usize,
        /// The rejected event value.
        event: String,
    },

    /// A step names a job that does not exist
    #[error("Step '{step}' is not defined as a job")]
    UndefinedStep {
        /// Name of the dangling step.
        step: String,
    },

    /// A job that will run has no image to run in
    #[error("Job '{job}' has no image and no default image applies")]
    MissingImage {
        /// Name of the job without an image.
        job: String,
    },
}

/// Every rule a pipeline violates, collected in one pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Creates an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Returns true if no violation was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded violations
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterates the recorded violations in discovery order
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Returns true if the given violation was recorded
    #[must_use]
    pub fn contains(&self, error: &ValidationError) -> bool {
        self.errors.contains(error)
    }

    /// `Ok(())` when empty, otherwise `Err(self)`
    #[allow(clippy::missing_errors_doc)]
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pipeline configuration is invalid:")?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Errors from [`Pipeline::load`](super::Pipeline::load)
#[derive(Error, Debug)]
pub enum LoadError {
    /// The document could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The document parsed but is not a valid pipeline
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_display_lists_every_violation() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::MissingName);
        errors.push(ValidationError::UndefinedStep {
            step: "deploy".to_string(),
        });

        let rendered = errors.to_string();
        assert!(rendered.contains("name cannot be empty"));
        assert!(rendered.contains("Step 'deploy' is not defined as a job"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());
        let errors = ValidationErrors::from(ValidationError::MissingSteps);
        assert_eq!(errors.clone().into_result(), Err(errors));
    }
}
