//! Engine configuration
//!
//! Loaded from JSON; every field has a default, so `{}` is a valid config.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compiler::DEFAULT_MAX_DNF_GROUPS;
use crate::executor::{ExecutorOptions, DEFAULT_FETCH_BATCH_SIZE, DEFAULT_MAX_CONCURRENT_LOOKUPS};
use crate::observability::LogLevel;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Document is not valid JSON for `EngineConfig`
    #[error("invalid engine configuration: {0}")]
    Parse(String),

    /// A setting is out of range
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Parse(_) => "AERO_CONFIG_PARSE",
            ConfigError::InvalidValue { .. } => "AERO_CONFIG_INVALID_VALUE",
        }
    }
}

/// Query engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bound on concurrently running indexed lookups (default: 5)
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,

    /// Keys per batched fetch in metadata cursor mode (default: 256)
    #[serde(default = "default_fetch_batch_size")]
    pub fetch_batch_size: usize,

    /// Fall back to the cursor path when ordering on an unindexed field
    /// (default: true). When false such queries fail with `IndexNotFound`.
    #[serde(default = "default_cursor_fallback")]
    pub cursor_fallback: bool,

    /// Largest normal form the compiler will produce (default: 1024)
    #[serde(default = "default_max_dnf_groups")]
    pub max_dnf_groups: usize,

    /// Log threshold (default: off)
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_max_concurrent_lookups() -> usize {
    DEFAULT_MAX_CONCURRENT_LOOKUPS
}

fn default_fetch_batch_size() -> usize {
    DEFAULT_FETCH_BATCH_SIZE
}

fn default_cursor_fallback() -> bool {
    true
}

fn default_max_dnf_groups() -> usize {
    DEFAULT_MAX_DNF_GROUPS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: default_max_concurrent_lookups(),
            fetch_batch_size: default_fetch_batch_size(),
            cursor_fallback: default_cursor_fallback(),
            max_dnf_groups: default_max_dnf_groups(),
            log_level: LogLevel::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON document
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects zero-sized limits
    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("max_concurrent_lookups", self.max_concurrent_lookups),
            ("fetch_batch_size", self.fetch_batch_size),
            ("max_dnf_groups", self.max_dnf_groups),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn with_cursor_fallback(mut self, enabled: bool) -> Self {
        self.cursor_fallback = enabled;
        self
    }

    /// Executor tuning derived from this config
    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            max_concurrent_lookups: self.max_concurrent_lookups,
            fetch_batch_size: self.fetch_batch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.max_concurrent_lookups, 5);
        assert_eq!(config.fetch_batch_size, 256);
        assert!(config.cursor_fallback);
        assert_eq!(config.max_dnf_groups, 1024);
        assert_eq!(config.log_level, LogLevel::Off);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config =
            EngineConfig::from_json_str(r#"{"fetch_batch_size": 8, "log_level": "warn"}"#).unwrap();
        assert_eq!(config.fetch_batch_size, 8);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.max_concurrent_lookups, 5);
    }

    #[test]
    fn test_rejects_zero_limits() {
        let err = EngineConfig::from_json_str(r#"{"max_concurrent_lookups": 0}"#).unwrap_err();
        assert_eq!(err.code(), "AERO_CONFIG_INVALID_VALUE");
        assert!(err.to_string().contains("max_concurrent_lookups"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = EngineConfig::from_json_str("{not json").unwrap_err();
        assert_eq!(err.code(), "AERO_CONFIG_PARSE");
    }
}
