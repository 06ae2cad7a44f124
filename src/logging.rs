//! Log output setup.
//!
//! Two sinks: stderr filtered by `RUST_LOG` (default `backupy=info`), and an
//! optional append-only log file at DEBUG with lines like
//! `INFO [10/19/2026 02:00:13] Starting backup source=/srv/www destination=/mnt/backup/www`.

use crate::error::{BackupError, Result};
use std::fmt;
use std::path::Path;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Timestamp layout used in the log file.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

const DEFAULT_CONSOLE_FILTER: &str = "backupy=info";
const FILE_FILTER: &str = "backupy=debug";

/// `LEVEL [timestamp] message` event format for the log file.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLineFormat;

impl<S, N> FormatEvent<S, N> for LogLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = event.metadata().level();
        let now = chrono::Local::now().format(TIMESTAMP_FORMAT);
        write!(writer, "{level} [{now}] ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber. Pass `None` to log to stderr only.
///
/// # Errors
///
/// Returns [`BackupError::Logging`] when the log file cannot be opened or a
/// subscriber is already installed.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_CONSOLE_FILTER)),
        );

    let file = match log_file {
        Some(path) => {
            let appender = open_log_file(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .event_format(LogLineFormat)
                    .with_writer(appender)
                    .with_filter(EnvFilter::new(FILE_FILTER)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| BackupError::Logging(format!("cannot install log subscriber: {e}")))
}

fn open_log_file(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BackupError::Logging(format!("invalid log file path {}", path.display())))?;

    tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .map_err(|e| BackupError::Logging(format!("cannot open log file {}: {e}", path.display())))
}
