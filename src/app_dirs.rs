//! Application directory paths for backupy.
//!
//! Everything backupy owns on disk lives in a single application directory:
//!
//! | File | Purpose |
//! |------|---------|
//! | `backupy.toml` | sources, destination, time limit, rsync flags |
//! | `backupy.log` | DEBUG-level run log |
//! | `.backupy.state` | last attempted source and its outcome |
//!
//! # Environment Overrides
//!
//! - `BACKUPY_HOME` — overrides [`app_dir`]

use std::path::PathBuf;

/// Environment variable overriding the application directory.
pub const APP_DIR_ENV: &str = "BACKUPY_HOME";

/// Application directory.
///
/// Resolves to `~/.backupy/` by default. Override with the `BACKUPY_HOME`
/// environment variable.
#[must_use]
pub fn app_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os(APP_DIR_ENV) {
        return PathBuf::from(override_dir);
    }
    dirs::home_dir()
        .map(|d| d.join(".backupy"))
        .unwrap_or_else(|| PathBuf::from("/tmp/backupy"))
}

/// Resolved file locations under one application directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Application directory.
    pub root: PathBuf,
    /// Config file.
    pub config: PathBuf,
    /// Log file.
    pub log: PathBuf,
    /// Run-state store.
    pub state: PathBuf,
}

impl AppPaths {
    /// Standard layout under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config: root.join(CONFIG_FILE_NAME),
            log: root.join(LOG_FILE_NAME),
            state: root.join(STATE_FILE_NAME),
            root,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new(app_dir())
    }
}

const CONFIG_FILE_NAME: &str = "backupy.toml";
const LOG_FILE_NAME: &str = "backupy.log";
const STATE_FILE_NAME: &str = ".backupy.state";
