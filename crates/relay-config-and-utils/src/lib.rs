//! Configuration, paths, and logging setup for the statistics relay.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_LOG_LEVEL, DEFAULT_WEB_URL_BASE, LOG_LEVEL_ENV, MAX_CORRELATION_MAX_AGE_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level, LogFormat};
pub use paths::{Paths, HOME_ENV};
