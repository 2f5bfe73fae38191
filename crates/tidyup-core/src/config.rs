//! Runtime configuration resolved once at startup.
//!
//! The data directory comes from, in order:
//!
//! 1. An explicit override (the daemon's `--data-dir` flag)
//! 2. The `TIDYUP_DATA_DIR` environment variable
//! 3. The platform default from [`crate::paths::app_data_dir`]

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::paths;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "TIDYUP_DATA_DIR";

const FILE_ENTRY_STATE_FILE: &str = "tidyupfilelist";
const DIRECTORY_ENTRY_STATE_FILE: &str = "tidyupwatchlist";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine data directory: {0}")]
    NoDataDir(String),

    #[error("Could not create data directory {}: {source}", path.display())]
    CreateDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where TidyUp keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TidyConfig {
    data_dir: PathBuf,
}

impl TidyConfig {
    /// Use `data_dir` as-is.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolve the data directory from the override, the environment, or the
    /// platform default.
    pub fn resolve(data_dir_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(DATA_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::resolve_from(data_dir_override, from_env)
    }

    fn resolve_from(
        data_dir_override: Option<PathBuf>,
        from_env: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let data_dir = match data_dir_override.or(from_env) {
            Some(dir) => dir,
            None => paths::app_data_dir().map_err(ConfigError::NoDataDir)?,
        };
        Ok(Self::new(data_dir))
    }

    /// Create the data directory if it doesn't exist.
    ///
    /// The state files never create parent directories themselves, so this
    /// must run before the first save.
    pub fn ensure_data_dir(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| ConfigError::CreateDataDir {
            path: self.data_dir.clone(),
            source,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// State file holding tracked [`FileEntry`](crate::persistence::FileEntry) records.
    pub fn file_entry_state_path(&self) -> PathBuf {
        self.data_dir.join(FILE_ENTRY_STATE_FILE)
    }

    /// State file holding the watch list.
    pub fn directory_entry_state_path(&self) -> PathBuf {
        self.data_dir.join(DIRECTORY_ENTRY_STATE_FILE)
    }
}
