//! Error types for backupy.

/// Top-level error type for the backup runner.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Configuration could not be read, parsed, or validated.
    #[error("config error: {0}")]
    Config(String),

    /// Run-state store could not be read or persisted.
    #[error("state store error: {0}")]
    Store(String),

    /// Requested key is not present in the run-state store.
    #[error("state key not found: {key}")]
    KeyNotFound {
        /// The missing key.
        key: String,
    },

    /// Sync tool could not be prepared (e.g. empty program name).
    #[error("sync error: {0}")]
    Sync(String),

    /// Log output could not be set up.
    #[error("logging error: {0}")]
    Logging(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, BackupError>;
