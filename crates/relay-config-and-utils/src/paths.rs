//! Where the relay keeps its files.

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Overrides the relay home directory.
pub const HOME_ENV: &str = "STATS_RELAY_HOME";

const HOME_DIR_NAME: &str = ".stats-relay";
const CONFIG_FILE_NAME: &str = "config.json";

/// Relay home directory and the files under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    home: PathBuf,
}

impl Paths {
    /// Resolve the relay home: `$STATS_RELAY_HOME` if set, else `~/.stats-relay`.
    pub fn new() -> CoreResult<Self> {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_base_dir(PathBuf::from(home)));
        }

        dirs::home_dir()
            .map(|home| Self::with_base_dir(home.join(HOME_DIR_NAME)))
            .ok_or(CoreError::HomeDirUnavailable)
    }

    pub fn with_base_dir(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.home
    }

    /// `<home>/config.json`
    pub fn config_file(&self) -> PathBuf {
        self.home.join(CONFIG_FILE_NAME)
    }

    /// Create the home directory if it is missing.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.home)?;
        Ok(())
    }
}
