//! Pipeline and job variables
//!
//! Documents may write variable values as strings, booleans, integers or
//! null; they are kept as strings. Floating point values are rejected since
//! their source text cannot be recovered (`3.10` would read back as `3.1`). [`merge_environment`] builds the environment handed to a job's
//! commands.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashMap};

/// Variable mapping as written in a document
pub type Variables = HashMap<String, String>;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Null(()),
}

impl Scalar {
    fn into_string(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            Self::Bool(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Unsigned(u) => Some(u.to_string()),
            Self::Float(_) => None,
            Self::Null(()) => Some(String::new()),
        }
    }
}

/// Deserializes a variable mapping whose values may be any scalar.
///
/// A missing or null mapping yields an empty one. A floating point value is
/// an error asking for the value to be quoted.
pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Variables, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Scalar>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|(key, value)| match value.into_string() {
            Some(text) => Ok((key, text)),
            None => Err(D::Error::custom(format!(
                "variable '{key}' has a floating point value; quote it to keep its exact text"
            ))),
        })
        .collect()
}

/// Overlays `job` on top of `pipeline`; job values win on collision.
///
/// The result is ordered by key so anything derived from it is reproducible.
#[must_use]
pub fn merge_environment(pipeline: &Variables, job: &Variables) -> BTreeMap<String, String> {
    let mut env: BTreeMap<String, String> = pipeline
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (key, value) in job {
        env.insert(key.clone(), value.clone());
    }
    env
}

/// Renders an environment as the `KEY=VALUE` list the engine expects.
#[must_use]
pub fn to_env_list(env: &BTreeMap<String, String>) -> Vec<String> {
    env.iter().map(|(k, v)| format!("{k}={v}")).collect()
}
