//! Pipeline triggers
//!
//! A trigger describes when a pipeline is meant to run. Unknown event names
//! survive parsing and are rejected by validation instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Event kinds a trigger can react to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TriggerEvent {
    /// Push to the repository
    Push,
    /// Merge request opened or updated
    MergeRequest,
    /// Tag pushed to the repository
    Tag,
    /// Manually started
    Manual,
    /// Anything else; invalid
    Unknown(String),
}

impl TriggerEvent {
    /// Name as written in documents
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Push => "push",
            Self::MergeRequest => "merge_request",
            Self::Tag => "tag",
            Self::Manual => "manual",
            Self::Unknown(other) => other,
        }
    }

    /// Returns true for the supported event kinds
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Operator-facing description
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Push => "on push to repository",
            Self::MergeRequest => "on merge request",
            Self::Tag => "on tag push to repository",
            Self::Manual => "on manual trigger",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<String> for TriggerEvent {
    fn from(value: String) -> Self {
        match value.as_str() {
            "push" => Self::Push,
            "merge_request" => Self::MergeRequest,
            "tag" => Self::Tag,
            "manual" => Self::Manual,
            _ => Self::Unknown(value),
        }
    }
}

impl From<TriggerEvent> for String {
    fn from(event: TriggerEvent) -> Self {
        event.as_str().to_string()
    }
}

impl Default for TriggerEvent {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A condition under which the pipeline is meant to run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Trigger {
    /// Event kind
    pub event: TriggerEvent,

    /// Branch filter
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,

    /// Extra condition expression
    #[serde(rename = "if", skip_serializing_if = "String::is_empty")]
    pub condition: String,
}

impl Trigger {
    /// Creates a trigger for `event` with no filters
    #[must_use]
    pub fn on(event: TriggerEvent) -> Self {
        Self {
            event,
            ..Self::default()
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event.describe())?;
        if !self.condition.is_empty() {
            write!(f, " (if {})", self.condition)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_events_parse() {
        let trigger: Trigger = serde_yaml::from_str("event: merge_request").unwrap();
        assert_eq!(trigger.event, TriggerEvent::MergeRequest);
        assert!(trigger.event.is_known());
    }

    #[test]
    fn test_unknown_event_survives_parsing() {
        let trigger: Trigger = serde_yaml::from_str("event: always").unwrap();
        assert_eq!(trigger.event, TriggerEvent::Unknown("always".to_string()));
        assert!(!trigger.event.is_known());
    }

    #[test]
    fn test_branches_and_condition() {
        let trigger: Trigger =
            serde_yaml::from_str("event: push\nbranches: [main]\nif: $CI == 'true'").unwrap();
        assert_eq!(trigger.branches, vec!["main"]);
        assert_eq!(trigger.condition, "$CI == 'true'");
        assert_eq!(trigger.to_string(), "on push to repository (if $CI == 'true')");
    }

    #[test]
    fn test_event_serializes_as_name() {
        let yaml = serde_yaml::to_string(&Trigger::on(TriggerEvent::Tag)).unwrap();
        assert_eq!(yaml.trim(), "event: tag");
    }
}
