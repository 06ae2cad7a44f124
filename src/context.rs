//! Startup context handed to the backup loop.

use crate::config::BackupConfig;
use crate::error::Result;
use crate::scheduler::state::PersistedState;
use crate::store::StateStore;
use std::path::{Path, PathBuf};

/// Everything a run needs, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Validated configuration.
    pub config: BackupConfig,
    /// Run-state store location.
    pub state_path: PathBuf,
}

impl AppContext {
    /// Wrap an already-validated configuration.
    pub fn new(config: BackupConfig, state_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            state_path: state_path.into(),
        }
    }

    /// Load and validate the config file at `config_path`.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Config`](crate::error::BackupError::Config) when
    /// the file is missing, malformed, or invalid.
    pub fn load(config_path: &Path, state_path: impl Into<PathBuf>) -> Result<Self> {
        let config = BackupConfig::from_file(config_path)?;
        Ok(Self::new(config, state_path))
    }

    /// Open the run-state store seeded with empty defaults.
    ///
    /// # Errors
    ///
    /// See [`StateStore::open`].
    pub fn open_store(&self) -> Result<StateStore> {
        StateStore::open(&self.state_path, PersistedState::store_defaults())
    }
}
