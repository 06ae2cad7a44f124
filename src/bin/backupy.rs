//! CLI binary for backupy.
//!
//! Runs the backup loop once and exits. Meant to be triggered externally
//! (cron, systemd timer). Do not run two instances against the same state
//! file at the same time.

use anyhow::Context;
use backupy::app_dirs::AppPaths;
use backupy::scheduler::{BackupScheduler, PersistedState};
use backupy::{AppContext, RsyncInvoker};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

/// Backupy: time-bounded, resumable rsync rotation.
#[derive(Parser)]
#[command(name = "backupy", version, about)]
struct Cli {
    /// Application directory (default: $BACKUPY_HOME or ~/.backupy).
    #[arg(long, global = true)]
    app_dir: Option<PathBuf>,

    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the run-state file.
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Log to stderr only.
    #[arg(long, global = true)]
    no_log_file: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Back up sources until all are done or the time limit is reached.
    Run,

    /// Show the recorded state and the order the next run would use.
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = cli.app_dir.map_or_else(AppPaths::default, AppPaths::new);
    let log_file = (!cli.no_log_file).then(|| paths.log.clone());
    backupy::logging::init(log_file.as_deref())?;

    let config_path = cli.config.unwrap_or_else(|| paths.config.clone());
    let state_path = cli.state.unwrap_or_else(|| paths.state.clone());
    let ctx = AppContext::load(&config_path, state_path)
        .with_context(|| format!("cannot load config {}", config_path.display()))?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_backup(&ctx).await,
        Command::Status => show_status(&ctx),
    }
}

async fn run_backup(ctx: &AppContext) -> anyhow::Result<()> {
    info!("Initializing backupy v{}", env!("CARGO_PKG_VERSION"));
    let store = ctx.open_store()?;
    debug!("state info: {store}");

    let invoker = RsyncInvoker::new(ctx.config.backup.tool.clone())?;
    let mut scheduler = BackupScheduler::new(ctx, store, Box::new(invoker));
    let report = scheduler.run().await.map_err(|e| {
        tracing::error!(error = %e, "backup run aborted");
        anyhow::anyhow!("backup run aborted: {e}")
    })?;

    if report.halted_by_time_limit {
        info!("{} sources deferred to the next run", report.deferred.len());
    }
    Ok(())
}

fn show_status(ctx: &AppContext) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let state = PersistedState::load(&store);

    println!("State file: {}", store.path().display());
    match (&state.last_source, state.last_state) {
        (Some(source), Some(outcome)) => println!("Last source: {source} ({outcome})"),
        (Some(source), None) => println!("Last source: {source} (no outcome recorded)"),
        _ => println!("Last source: none"),
    }

    let order = backupy::scheduler::rotate(
        &ctx.config.source_ids(),
        state.last_source.as_deref(),
        state.last_state,
    );
    println!("\nNext run order:");
    for (position, source) in order.iter().enumerate() {
        let destination = ctx
            .config
            .destination_for(source)
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        println!("  {}. {source} --> {destination}", position + 1);
    }
    Ok(())
}
