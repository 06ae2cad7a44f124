//! Configuration types for the backup runner.
//!
//! ```toml
//! [backup]
//! destination = "/mnt/backup"
//! time_limit = 6.5          # hours
//!
//! [sources]
//! "/home/alice/projects" = "projects"
//! "/srv/www" = "www"
//!
//! [rsync]
//! --archive = true
//! --delete = ""
//! --exclude = "*.tmp"
//! --bwlimit = 1000
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration: where to back up, what, and how.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Destination root and time budget.
    pub backup: BackupSettings,
    /// Source path -> destination subpath, in visiting order.
    pub sources: IndexMap<String, String>,
    /// Sync tool flags, rendered in file order.
    pub rsync: IndexMap<String, OptionValue>,
}

/// `[backup]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    /// Root directory all source subpaths are resolved against.
    pub destination: PathBuf,
    /// Wall-clock budget for one run, in hours.
    pub time_limit: f64,
    /// Sync tool program name or path.
    pub tool: String,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            destination: PathBuf::new(),
            time_limit: 1.0,
            tool: "rsync".to_owned(),
        }
    }
}

/// Value of one sync tool flag.
///
/// `true` and `""` render the bare flag, a non-empty string or a number
/// renders `flag="value"`, and `false` leaves the flag out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Bare flag switch.
    Switch(bool),
    /// Integer value, e.g. `--bwlimit = 1000`.
    Integer(i64),
    /// Float value, e.g. `--max-alloc = 1.5`.
    Float(f64),
    /// Flag with a value.
    Value(String),
}

impl OptionValue {
    /// The value to attach to the flag as text, or `None` for a bare flag.
    #[must_use]
    pub fn value(&self) -> Option<String> {
        match self {
            Self::Switch(_) => None,
            Self::Integer(n) => Some(n.to_string()),
            Self::Float(x) => Some(x.to_string()),
            Self::Value(v) if v.is_empty() => None,
            Self::Value(v) => Some(v.clone()),
        }
    }

    /// Whether the flag is passed at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Switch(false))
    }
}

impl BackupConfig {
    /// Load configuration from a TOML file and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::BackupError::Config(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::BackupError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the backup loop relies on.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Config`](crate::error::BackupError::Config)
    /// describing the first violated rule.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::BackupError;

        if self.backup.destination.as_os_str().is_empty() {
            return Err(BackupError::Config(
                "backup.destination must be set".to_owned(),
            ));
        }
        if !self.backup.time_limit.is_finite() || self.backup.time_limit < 0.0 {
            return Err(BackupError::Config(format!(
                "backup.time_limit must be a non-negative number of hours, got {}",
                self.backup.time_limit
            )));
        }
        if self.backup.tool.trim().is_empty() {
            return Err(BackupError::Config("backup.tool must not be empty".to_owned()));
        }
        if let Some(empty) = self.sources.keys().find(|k| k.trim().is_empty()) {
            return Err(BackupError::Config(format!(
                "source identifiers must not be empty (got {empty:?})"
            )));
        }
        Ok(())
    }

    /// Source identifiers in configured order.
    #[must_use]
    pub fn source_ids(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }

    /// Time budget for one run. Saturates for absurdly large limits.
    #[must_use]
    pub fn time_budget(&self) -> Duration {
        Duration::try_from_secs_f64(self.backup.time_limit * 3600.0).unwrap_or(Duration::MAX)
    }

    /// Resolve the destination directory for a configured source.
    #[must_use]
    pub fn destination_for(&self, source: &str) -> Option<PathBuf> {
        self.sources
            .get(source)
            .map(|subpath| self.backup.destination.join(subpath))
    }
}
