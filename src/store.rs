//! Crash-safe key/value store for run state.
//!
//! The whole content is rewritten on every [`StateStore::update`]
//! (temp file → fsync → rename), so a reader always sees either the previous
//! or the new content, never a torn mix. A missing, empty, or corrupt
//! store file opens as the caller-supplied defaults.
//!
//! Only one process may use a given store file at a time. Nothing here
//! guards against two concurrent writers.

use crate::error::{BackupError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Store content: string keys to JSON values.
pub type StateMap = BTreeMap<String, Value>;

/// On-disk envelope.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default = "default_store_version")]
    version: u8,
    #[serde(default)]
    entries: StateMap,
}

fn default_store_version() -> u8 {
    1
}

/// File-backed key/value store that survives process restarts.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    content: StateMap,
    saved: bool,
}

impl StateStore {
    /// Open the store at `path`, seeding it with `defaults`.
    ///
    /// Values read from a well-formed file overlay the defaults. A missing,
    /// empty, or corrupt file yields exactly `defaults`, and the store counts
    /// as unsaved until the first [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Store`] only when the file exists but cannot be
    /// read at all (e.g. permission denied). Corrupt content is never an error.
    pub fn open(path: impl Into<PathBuf>, defaults: StateMap) -> Result<Self> {
        let path = path.into();
        let mut content = defaults;

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
                ) =>
            {
                None
            }
            Err(e) => {
                return Err(BackupError::Store(format!(
                    "cannot read state store {}: {e}",
                    path.display()
                )));
            }
        };

        let saved = match bytes.as_deref().map(serde_json::from_slice::<StoreFile>) {
            Some(Ok(file)) => {
                content.extend(file.entries);
                debug!("loaded state store from {}", path.display());
                true
            }
            Some(Err(e)) => {
                warn!(
                    "ignoring unreadable state store at {}, using defaults: {e}",
                    path.display()
                );
                false
            }
            None => false,
        };

        Ok(Self {
            path,
            content,
            saved,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::KeyNotFound`] when the key is absent.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.content
            .get(key)
            .ok_or_else(|| BackupError::KeyNotFound {
                key: key.to_owned(),
            })
    }

    /// Whether `key` is present.
    pub fn has(&self, key: &str) -> bool {
        self.content.contains_key(key)
    }

    /// Known keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.content.keys().map(String::as_str)
    }

    /// `true` once the current content has been written to disk.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Merge `changes` into the content and durably persist the whole store.
    ///
    /// Returns only after the new content is on disk. When persisting fails
    /// the in-memory content is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Store`] when the file cannot be written.
    pub fn update<I, K>(&mut self, changes: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut next = self.content.clone();
        for (key, value) in changes {
            next.insert(key.into(), value);
        }

        write_store_atomic(&self.path, &next)?;
        self.content = next;
        self.saved = true;
        Ok(())
    }
}

impl fmt::Display for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.content) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self.content),
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "state".into());
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_store_atomic(path: &Path, entries: &StateMap) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            BackupError::Store(format!(
                "failed to create state directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let file = StoreFile {
        version: default_store_version(),
        entries: entries.clone(),
    };
    let json = serde_json::to_vec(&file)
        .map_err(|e| BackupError::Store(format!("failed to serialize state: {e}")))?;

    let tmp_path = temp_path_for(path);
    let mut tmp = std::fs::File::create(&tmp_path).map_err(|e| {
        BackupError::Store(format!(
            "failed to create temp file '{}': {e}",
            tmp_path.display()
        ))
    })?;
    tmp.write_all(&json)
        .map_err(|e| BackupError::Store(format!("failed to write temp file: {e}")))?;
    tmp.sync_all()
        .map_err(|e| BackupError::Store(format!("failed to sync temp file: {e}")))?;
    drop(tmp);

    std::fs::rename(&tmp_path, path).map_err(|e| {
        BackupError::Store(format!(
            "failed to rename '{}' to '{}': {e}",
            tmp_path.display(),
            path.display()
        ))
    })?;

    sync_parent_dir(path);
    Ok(())
}

/// Make a completed rename durable.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        && let Ok(dir) = std::fs::File::open(parent)
    {
        let _ = dir.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}
