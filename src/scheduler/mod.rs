//! Backup scheduling: rotation order, persisted run state, and the
//! time-bounded loop that ties them to the sync tool.

pub mod rotation;
pub mod runner;
pub mod state;

pub use rotation::rotate;
pub use runner::{BackupScheduler, Clock, RunReport, SourceAttempt, SystemClock};
pub use state::{PersistedState, RunOutcome};
