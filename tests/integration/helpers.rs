//! Shared helpers for integration tests.

use backupy::config::BackupConfig;
use backupy::{AppContext, PersistedState, RunOutcome, StateStore};
use std::path::{Path, PathBuf};

/// Write an executable `/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub(crate) fn write_fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake tool");
    let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod fake tool");
    path
}

/// Context with `sources` mapped to lowercase subpaths under `<dir>/dest`.
pub(crate) fn context(dir: &Path, sources: &[&str], tool: &Path, time_limit: f64) -> AppContext {
    let mut config = BackupConfig::default();
    config.backup.destination = dir.join("dest");
    config.backup.time_limit = time_limit;
    config.backup.tool = tool.display().to_string();
    for id in sources {
        config.sources.insert((*id).to_owned(), id.to_lowercase());
    }
    config.validate().expect("valid test config");
    AppContext::new(config, dir.join(".backupy.state"))
}

/// Read the persisted state back through a freshly opened store.
pub(crate) fn reload_state(path: &Path) -> PersistedState {
    let store = StateStore::open(path, PersistedState::store_defaults()).expect("reopen store");
    PersistedState::load(&store)
}

/// Seed the store at `path` with a prior attempt.
pub(crate) fn seed_state(path: &Path, source: &str, outcome: RunOutcome) {
    let mut store =
        StateStore::open(path, PersistedState::store_defaults()).expect("open store");
    PersistedState::mark_started(&mut store, source).expect("seed started");
    if outcome != RunOutcome::Incomplete {
        PersistedState::mark_finished(&mut store, outcome).expect("seed finished");
    }
}

/// Clock that moves forward by `step` every time it is read.
pub(crate) struct StepClock {
    base: std::time::Instant,
    step: std::time::Duration,
    reads: std::sync::atomic::AtomicU32,
}

impl StepClock {
    pub(crate) fn new(step: std::time::Duration) -> Self {
        Self {
            base: std::time::Instant::now(),
            step,
            reads: std::sync::atomic::AtomicU32::new(0),
        }
    }
}

impl backupy::scheduler::Clock for StepClock {
    fn now(&self) -> std::time::Instant {
        let n = self.reads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.base + self.step * n
    }
}
