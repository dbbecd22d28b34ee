//! Logging initialization for the statistics relay.
//!
//! Components log through the `tracing` macros only. The subscriber is
//! installed once by the embedding process:
//!
//! ```ignore
//! relay_config_and_utils::init_logging(&config.log_level);
//! tracing::info!("relay started");
//! ```
//!
//! `RUST_LOG` overrides the configured level. Setting
//! `STATS_RELAY_LOG_FORMAT=json` switches to structured JSON lines.

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact human-readable lines.
    Compact,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Read the format from `STATS_RELAY_LOG_FORMAT`, defaulting to compact.
    pub fn from_env() -> Self {
        std::env::var("STATS_RELAY_LOG_FORMAT")
            .map(|raw| Self::parse(&raw))
            .unwrap_or(LogFormat::Compact)
    }

    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Returns `false` if a subscriber was already installed (e.g. by a test
/// harness or the host process); the existing one is left untouched.
pub fn init_logging(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(parse_level(level)).into())
    });

    let installed = match LogFormat::from_env() {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init(),
    };

    installed.is_ok()
}

/// Map a configured level name to a tracing level.
///
/// Accepts anything `tracing::Level` parses plus `warning`; unknown names
/// fall back to `info`.
pub fn parse_level(level: &str) -> Level {
    let level = level.trim();
    if level.eq_ignore_ascii_case("warning") {
        return Level::WARN;
    }
    level.parse().unwrap_or(Level::INFO)
}
