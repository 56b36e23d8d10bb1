//! Domain error types
//!
//! `ConfigError` is the only failure the pane reports through `Result`.
//! Data-quality problems in the message feed are `DataWarning`s: logged and
//! attached to the row, never returned as errors.

use thiserror::Error;

/// Errors raised while building or validating pane configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A distance threshold was negative, NaN or infinite
    #[error("Invalid {field}: {value} (must be a finite, non-negative number)")]
    InvalidThreshold { field: &'static str, value: f64 },

    /// The end-reached debounce window must be non-zero
    #[error("Invalid debounce window: must be greater than 0ms")]
    ZeroDebounce,

    /// TOML could not be parsed into a config
    #[error("Failed to parse config: {0}")]
    Parse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Non-fatal problems found in a message while building its row
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataWarning {
    /// The message has no `_id`
    #[error("`_id` is missing for message: {0}")]
    MissingId(String),

    /// A non-system message has no `user`
    #[error("`user` is missing for message: {0}")]
    MissingUser(String),
}
