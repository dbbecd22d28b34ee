//! Configuration management for the statistics relay.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Overrides `log_level`.
pub const LOG_LEVEL_ENV: &str = "STATS_RELAY_LOG_LEVEL";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Largest accepted `correlation_max_age_secs` (one year).
pub const MAX_CORRELATION_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;

/// Default base URL used to build follow-up links to uploaded games.
pub const DEFAULT_WEB_URL_BASE: &str = "https://nucleoid.xyz/game/";

/// Relay configuration.
///
/// Every field has a default so partial config files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Whether finished games upload their statistic bundles at all.
    pub send_statistics: bool,
    /// Maximum number of bundles held for retransmission. `None` is unbounded.
    pub retry_queue_capacity: Option<usize>,
    /// Maximum age in seconds of an unacknowledged upload. `None` keeps entries forever.
    pub correlation_max_age_secs: Option<u64>,
    /// Base URL for follow-up links to an uploaded game.
    pub web_url_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            send_statistics: false,
            retry_queue_capacity: None,
            correlation_max_age_secs: None,
            web_url_base: DEFAULT_WEB_URL_BASE.to_string(),
        }
    }
}

impl Config {
    /// Defaults with environment overrides applied.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Read `<home>/config.json` if present, apply environment overrides,
    /// and validate the result.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let path = paths.config_file();
        let mut config = match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(CoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the config as pretty JSON, creating the home directory first.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        std::fs::write(paths.config_file(), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject limits of zero, ages beyond [`MAX_CORRELATION_MAX_AGE_SECS`],
    /// and an empty link base.
    pub fn validate(&self) -> CoreResult<()> {
        if self.retry_queue_capacity == Some(0) {
            return Err(invalid("retry_queue_capacity", "must be at least 1 when set"));
        }
        match self.correlation_max_age_secs {
            Some(0) => {
                return Err(invalid("correlation_max_age_secs", "must be at least 1 when set"));
            }
            Some(secs) if secs > MAX_CORRELATION_MAX_AGE_SECS => {
                return Err(CoreError::InvalidConfig {
                    field: "correlation_max_age_secs",
                    reason: format!("must be at most {MAX_CORRELATION_MAX_AGE_SECS}, got {secs}"),
                });
            }
            _ => {}
        }
        if self.web_url_base.trim().is_empty() {
            return Err(invalid("web_url_base", "must not be empty"));
        }
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            if !level.trim().is_empty() {
                self.log_level = level;
            }
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> CoreError {
    CoreError::InvalidConfig {
        field,
        reason: reason.to_string(),
    }
}
