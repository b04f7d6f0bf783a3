//! Configuration management
//!
//! Runtime settings come from `RUNWAY_*` environment variables layered over
//! [`Settings::default`].

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Engine host endpoint, e.g. `unix:///var/run/docker.sock`
pub const ENV_DOCKER_HOST: &str = "RUNWAY_DOCKER_HOST";
/// Shell used to interpret commands, split into words
pub const ENV_SHELL: &str = "RUNWAY_SHELL";
/// Readiness probes before a container is declared unusable
pub const ENV_READY_ATTEMPTS: &str = "RUNWAY_READY_ATTEMPTS";
/// Pause between readiness probes
pub const ENV_READY_INTERVAL_MS: &str = "RUNWAY_READY_INTERVAL_MS";
/// Engine client request timeout
pub const ENV_ENGINE_TIMEOUT_SECS: &str = "RUNWAY_ENGINE_TIMEOUT_SECS";
/// Default log filter
pub const ENV_LOG: &str = "RUNWAY_LOG";

/// Errors raised while reading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A numeric variable did not parse
    #[error("{name} must be a non-negative integer, got '{value}'")]
    InvalidNumber {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },

    /// The shell variable split into nothing
    #[error("RUNWAY_SHELL must name a shell")]
    EmptyShell,

    /// The shell variable is not valid shell words
    #[error("RUNWAY_SHELL is not a valid command line: {0}")]
    InvalidShell(#[from] shell_words::ParseError),

    /// The engine host is not a URL
    #[error("RUNWAY_DOCKER_HOST is not a valid URL: {0}")]
    InvalidHost(#[from] url::ParseError),
}

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Engine endpoint; platform default when unset
    pub docker_host: Option<String>,
    /// Command prefix each script line is appended to
    pub shell: Vec<String>,
    /// Readiness probes before giving up on a container
    pub ready_attempts: u32,
    /// Pause between readiness probes, in milliseconds
    pub ready_interval_ms: u64,
    /// Engine client timeout, in seconds
    pub engine_timeout_secs: u64,
    /// Default log filter
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            docker_host: None,
            shell: vec!["/bin/sh".to_string(), "-c".to_string()],
            ready_attempts: 20,
            ready_interval_ms: 250,
            engine_timeout_secs: 120,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for
    /// variables it does not know. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(host) = get(ENV_DOCKER_HOST) {
            Url::parse(&host)?;
            settings.docker_host = Some(host);
        }
        if let Some(shell) = get(ENV_SHELL) {
            let words = shell_words::split(&shell)?;
            if words.is_empty() {
                return Err(ConfigError::EmptyShell);
            }
            settings.shell = words;
        }
        if let Some(value) = get(ENV_READY_ATTEMPTS) {
            settings.ready_attempts = parse_number(ENV_READY_ATTEMPTS, &value)?;
        }
        if let Some(value) = get(ENV_READY_INTERVAL_MS) {
            settings.ready_interval_ms = parse_number(ENV_READY_INTERVAL_MS, &value)?;
        }
        if let Some(value) = get(ENV_ENGINE_TIMEOUT_SECS) {
            settings.engine_timeout_secs = parse_number(ENV_ENGINE_TIMEOUT_SECS, &value)?;
        }
        if let Some(level) = get(ENV_LOG) {
            settings.log_level = level;
        }
        Ok(settings)
    }

    /// Pause between readiness probes
    #[must_use]
    pub fn ready_interval(&self) -> Duration {
        Duration::from_millis(self.ready_interval_ms)
    }

    /// Engine client timeout
    #[must_use]
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.docker_host, None);
        assert_eq!(settings.shell, vec!["/bin/sh", "-c"]);
        assert_eq!(settings.ready_attempts, 20);
        assert_eq!(settings.ready_interval(), Duration::from_millis(250));
        assert_eq!(settings.engine_timeout(), Duration::from_secs(120));
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(settings(&[]).unwrap(), Settings::default());
        assert_eq!(settings(&[(ENV_SHELL, "  ")]).unwrap(), Settings::default());
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            (ENV_DOCKER_HOST, "tcp://10.0.0.5:2375"),
            (ENV_SHELL, "/bin/bash -eo pipefail -c"),
            (ENV_READY_ATTEMPTS, "5"),
            (ENV_READY_INTERVAL_MS, "10"),
            (ENV_ENGINE_TIMEOUT_SECS, "30"),
            (ENV_LOG, "debug"),
        ])
        .unwrap();

        assert_eq!(settings.docker_host.as_deref(), Some("tcp://10.0.0.5:2375"));
        assert_eq!(settings.shell, vec!["/bin/bash", "-eo", "pipefail", "-c"]);
        assert_eq!(settings.ready_attempts, 5);
        assert_eq!(settings.ready_interval_ms, 10);
        assert_eq!(settings.engine_timeout_secs, 30);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_invalid_number() {
        let err = settings(&[(ENV_READY_ATTEMPTS, "many")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber { name: ENV_READY_ATTEMPTS, .. }
        ));
        assert!(err.to_string().contains("many"));
    }

    #[test]
    fn test_invalid_shell() {
        let err = settings(&[(ENV_SHELL, "/bin/sh -c 'unterminated")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidShell(_)));
    }

    #[test]
    fn test_invalid_host() {
        let err = settings(&[(ENV_DOCKER_HOST, "localhost without scheme")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHost(_)));
    }
}
