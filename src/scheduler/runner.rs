//! Time-bounded backup loop.
//!
//! One run visits the configured sources in rotation order, one at a time.
//! Before each source the wall-clock budget is checked; once it is spent the
//! remaining sources are left for the next run. Every attempt is bracketed by
//! two durable state writes (INCOMPLETE before the tool starts, the terminal
//! outcome after it exits) so a crash never leaves the state claiming more
//! progress than was made.

use crate::context::AppContext;
use crate::error::Result;
use crate::scheduler::rotation;
use crate::scheduler::state::{PersistedState, RunOutcome};
use crate::store::StateStore;
use crate::sync::{SyncInvoker, SyncReport};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current monotonic instant.
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// One source visited during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAttempt {
    /// Source identifier.
    pub source: String,
    /// Resolved destination directory.
    pub destination: PathBuf,
    /// Terminal outcome.
    pub outcome: RunOutcome,
}

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Sources attempted, in visiting order.
    pub attempts: Vec<SourceAttempt>,
    /// Sources left for the next run because the time limit was reached.
    pub deferred: Vec<String>,
    /// `true` when the time limit stopped the run early.
    pub halted_by_time_limit: bool,
}

impl RunReport {
    /// Visited source identifiers in order.
    pub fn visited(&self) -> Vec<&str> {
        self.attempts.iter().map(|a| a.source.as_str()).collect()
    }

    /// Number of successful attempts.
    pub fn succeeded(&self) -> usize {
        self.count(RunOutcome::Success)
    }

    /// Number of failed attempts.
    pub fn failed(&self) -> usize {
        self.count(RunOutcome::Failed)
    }

    fn count(&self, outcome: RunOutcome) -> usize {
        self.attempts.iter().filter(|a| a.outcome == outcome).count()
    }
}

/// Drives one backup run. Sole writer of the run-state store while it runs.
pub struct BackupScheduler<'a> {
    ctx: &'a AppContext,
    store: StateStore,
    invoker: Box<dyn SyncInvoker>,
    clock: Box<dyn Clock>,
}

impl<'a> BackupScheduler<'a> {
    /// Create a scheduler over `store`, syncing with `invoker`.
    pub fn new(ctx: &'a AppContext, store: StateStore, invoker: Box<dyn SyncInvoker>) -> Self {
        Self {
            ctx,
            store,
            invoker,
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The run-state store.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Visiting order derived from the persisted state.
    pub fn rotation_order(&self) -> Vec<String> {
        let state = PersistedState::load(&self.store);
        rotation::rotate(
            &self.ctx.config.source_ids(),
            state.last_source.as_deref(),
            state.last_state,
        )
    }

    /// Run the loop once.
    ///
    /// Individual sync failures are recorded and logged, never returned.
    ///
    /// # Errors
    ///
    /// Returns an error only when the run state cannot be persisted; the
    /// crash-safety guarantee is void without it, so the run stops there.
    pub async fn run(&mut self) -> Result<RunReport> {
        let started = self.clock.now();
        let finish_time = started.checked_add(self.ctx.config.time_budget());
        let order = self.rotation_order();
        let mut report = RunReport::default();

        info!(
            "backup run started: {} sources, time limit {}h",
            order.len(),
            self.ctx.config.backup.time_limit
        );
        debug!("rotation order: {order:?}");

        for (index, source) in order.iter().enumerate() {
            if finish_time.is_some_and(|finish| self.clock.now() > finish) {
                info!("backup halted due to time limit");
                report.halted_by_time_limit = true;
                report.deferred = order[index..].to_vec();
                break;
            }

            // Guard only: `order` is built from these same configured sources.
            let Some(destination) = self.ctx.config.destination_for(source) else {
                warn!(%source, "source has no destination, skipping");
                continue;
            };

            info!(%source, destination = %destination.display(), "Starting backup");
            PersistedState::mark_started(&mut self.store, source)?;

            let sync = self
                .invoker
                .invoke(source, &destination, &self.ctx.config.rsync)
                .await;

            PersistedState::mark_finished(&mut self.store, sync.outcome)?;
            self.log_report(source, &sync);

            report.attempts.push(SourceAttempt {
                source: source.clone(),
                destination,
                outcome: sync.outcome,
            });
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            deferred = report.deferred.len(),
            "backup run finished in {:.1}s",
            self.clock.now().saturating_duration_since(started).as_secs_f64()
        );
        Ok(report)
    }

    fn log_report(&self, source: &str, sync: &SyncReport) {
        let tool = self.invoker.tool_name();
        match sync.outcome {
            RunOutcome::Success => {
                info!(source, outcome = %sync.outcome, "backup successfully completed");
                for line in &sync.output {
                    info!("[{tool}] {line}");
                }
            }
            _ => {
                match sync.exit_code {
                    Some(code) => error!(
                        source,
                        outcome = %sync.outcome,
                        "{tool} returned non-zero exit code: {code}"
                    ),
                    None => error!(source, outcome = %sync.outcome, "{tool} did not run to completion"),
                }
                for line in &sync.output {
                    error!("[{tool}] {line}");
                }
            }
        }
    }
}
