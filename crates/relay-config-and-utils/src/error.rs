//! Error types for relay configuration.

use thiserror::Error;

/// Errors raised while locating, reading, or validating relay configuration.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A config value is outside its accepted range.
    #[error("Invalid config field '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON or has the wrong shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither `STATS_RELAY_HOME` nor a home directory is available.
    #[error("No relay home directory: set STATS_RELAY_HOME or HOME")]
    HomeDirUnavailable,
}

pub type CoreResult<T> = Result<T, CoreError>;
