//! Backupy: resumable, time-bounded rsync rotation across backup sources.
//!
//! Each invocation runs the backup loop once:
//! config → rotation order → (time check → mark INCOMPLETE → rsync → mark outcome)*
//!
//! # Architecture
//!
//! - **Store** ([`store`]): crash-safe key/value file holding the last
//!   attempted source and its outcome
//! - **Rotation** ([`scheduler::rotation`]): where the next run starts, so
//!   failed sources are retried first and successful ones advance the cursor
//! - **Sync** ([`sync`]): one external tool process per source, never failing
//!   past its boundary
//! - **Scheduler** ([`scheduler::runner`]): the wall-clock bounded loop
//!
//! Running two instances against the same state file is not supported.

pub mod app_dirs;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod scheduler;
pub mod store;
pub mod sync;

pub use config::BackupConfig;
pub use context::AppContext;
pub use error::{BackupError, Result};
pub use scheduler::{BackupScheduler, PersistedState, RunOutcome, RunReport};
pub use store::StateStore;
pub use sync::{RsyncInvoker, SyncInvoker, SyncReport};
