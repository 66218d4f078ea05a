//! Configuration management for the marketplace client.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file is honoured when the binary calls [`dotenvy::dotenv`] first.

use marketplace_core::slice::StalePolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Base URL of the remote API
pub const API_URL: &str = "MARKETPLACE_API_URL";
/// HTTP timeout in seconds
pub const API_TIMEOUT_SECS: &str = "MARKETPLACE_API_TIMEOUT_SECS";
/// How long a facade call waits for its result, in seconds
pub const REQUEST_TIMEOUT_SECS: &str = "MARKETPLACE_REQUEST_TIMEOUT_SECS";
/// Log level (trace, debug, info, warn, error)
pub const LOG_LEVEL: &str = "MARKETPLACE_LOG_LEVEL";
/// `latest-wins` or `last-write-wins`
pub const STALE_POLICY: &str = "MARKETPLACE_STALE_POLICY";
/// Alert auto-dismiss delay in milliseconds; unset or `0` disables it
pub const ALERT_DISMISS_MS: &str = "MARKETPLACE_ALERT_DISMISS_MS";
/// Path of the JSON session file; unset keeps the session in memory
pub const SESSION_FILE: &str = "MARKETPLACE_SESSION_FILE";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },

    /// Values parse but do not make sense together
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the remote API, without a trailing slash
    pub api_url: String,
    /// HTTP timeout in seconds
    pub api_timeout_secs: u64,
    /// How long a facade call waits for its result, in seconds
    pub request_timeout_secs: u64,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// How responses superseded by a newer request are treated
    pub stale_policy: StalePolicy,
    /// Alert auto-dismiss delay in milliseconds
    pub alert_dismiss_ms: Option<u64>,
    /// Path of the JSON session file
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".to_string(),
            api_timeout_secs: 30,
            request_timeout_secs: 60,
            log_level: "info".to_string(),
            stale_policy: StalePolicy::default(),
            alert_dismiss_ms: None,
            session_file: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unparsable value
    /// or the result fails [`ClientConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Self {
            api_url: var(API_URL)
                .map_or(defaults.api_url, |url| url.trim().trim_end_matches('/').to_string()),
            api_timeout_secs: parse(API_TIMEOUT_SECS, var(API_TIMEOUT_SECS))?
                .unwrap_or(defaults.api_timeout_secs),
            request_timeout_secs: parse(REQUEST_TIMEOUT_SECS, var(REQUEST_TIMEOUT_SECS))?
                .unwrap_or(defaults.request_timeout_secs),
            log_level: var(LOG_LEVEL).map_or(defaults.log_level, |level| level.to_lowercase()),
            stale_policy: parse(STALE_POLICY, var(STALE_POLICY))?
                .unwrap_or(defaults.stale_policy),
            alert_dismiss_ms: parse::<u64>(ALERT_DISMISS_MS, var(ALERT_DISMISS_MS))?
                .filter(|ms| *ms > 0),
            session_file: var(SESSION_FILE).map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "api_url must start with http:// or https://, got {}",
                self.api_url
            )));
        }
        if self.api_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "api_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "invalid log_level: {}. Must be one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// HTTP timeout as Duration
    #[must_use]
    pub const fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Facade wait timeout as Duration
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Alert auto-dismiss delay, if enabled
    #[must_use]
    pub fn alert_dismiss(&self) -> Option<Duration> {
        self.alert_dismiss_ms.map(Duration::from_millis)
    }
}

fn parse<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value })
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.stale_policy, StalePolicy::LatestWins);
        assert_eq!(config.alert_dismiss(), None);
    }

    #[test]
    fn reads_every_variable() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL, "https://shop.example.com/api/"),
            (API_TIMEOUT_SECS, "5"),
            (REQUEST_TIMEOUT_SECS, "9"),
            (LOG_LEVEL, "DEBUG"),
            (STALE_POLICY, "last-write-wins"),
            (ALERT_DISMISS_MS, "3000"),
            (SESSION_FILE, "/tmp/session.json"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://shop.example.com/api");
        assert_eq!(config.api_timeout(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(9));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.stale_policy, StalePolicy::LastWriteWins);
        assert_eq!(config.alert_dismiss(), Some(Duration::from_millis(3000)));
        assert_eq!(config.session_file, Some(PathBuf::from("/tmp/session.json")));
    }

    #[test]
    fn zero_dismiss_delay_disables_it() {
        let config = ClientConfig::from_lookup(lookup(&[(ALERT_DISMISS_MS, "0")])).unwrap();
        assert_eq!(config.alert_dismiss_ms, None);
    }

    #[test]
    fn unparsable_values_are_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(API_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: API_TIMEOUT_SECS,
                value: "soon".to_string()
            }
        );

        let err = ClientConfig::from_lookup(lookup(&[(STALE_POLICY, "random")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: STALE_POLICY, .. }));
    }

    #[test]
    fn validation_catches_bad_values() {
        let config = ClientConfig {
            log_level: "verbose".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("log_level")
        ));

        let err = ClientConfig::from_lookup(lookup(&[(API_URL, "ftp://files")])).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
