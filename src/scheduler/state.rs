//! Run outcomes and the typed view of persisted run state.

use crate::error::Result;
use crate::store::{StateMap, StateStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Store key holding the most recently attempted source.
pub const LAST_SOURCE_KEY: &str = "last_source";
/// Store key holding the outcome of that attempt.
pub const LAST_STATE_KEY: &str = "last_state";

/// Classification of one source's sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The sync tool exited cleanly.
    Success,
    /// The source was selected but no terminal outcome was recorded yet.
    Incomplete,
    /// The sync tool exited non-zero or could not be launched.
    Failed,
}

impl RunOutcome {
    /// JSON value stored under [`LAST_STATE_KEY`].
    #[must_use]
    pub fn to_value(self) -> Value {
        Value::String(self.as_str().to_owned())
    }

    /// Lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Incomplete => "incomplete",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable memory carried between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    /// Most recently attempted source, if any.
    pub last_source: Option<String>,
    /// Outcome of that attempt, if any.
    pub last_state: Option<RunOutcome>,
}

impl PersistedState {
    /// Defaults seeded into a fresh store: both keys present and null.
    #[must_use]
    pub fn store_defaults() -> StateMap {
        StateMap::from([
            (LAST_SOURCE_KEY.to_owned(), Value::Null),
            (LAST_STATE_KEY.to_owned(), Value::Null),
        ])
    }

    /// Read the typed state. Absent or garbled values read as `None`.
    pub fn load(store: &StateStore) -> Self {
        let last_source = store
            .get(LAST_SOURCE_KEY)
            .ok()
            .and_then(Value::as_str)
            .map(str::to_owned);
        let last_state = store
            .get(LAST_STATE_KEY)
            .ok()
            .and_then(|v| serde_json::from_value::<RunOutcome>(v.clone()).ok());
        Self {
            last_source,
            last_state,
        }
    }

    /// Write-ahead marker: `source` is about to be synced.
    ///
    /// # Errors
    ///
    /// Propagates store persistence failures.
    pub fn mark_started(store: &mut StateStore, source: &str) -> Result<()> {
        store.update([
            (LAST_SOURCE_KEY, Value::String(source.to_owned())),
            (LAST_STATE_KEY, RunOutcome::Incomplete.to_value()),
        ])
    }

    /// Record the terminal outcome of the attempt started last.
    ///
    /// # Errors
    ///
    /// Propagates store persistence failures.
    pub fn mark_finished(store: &mut StateStore, outcome: RunOutcome) -> Result<()> {
        store.update([(LAST_STATE_KEY, outcome.to_value())])
    }
}
