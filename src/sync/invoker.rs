//! Runs the sync tool for one source and classifies the result.
//!
//! Every failure mode, from a missing binary to a non-zero exit, comes back
//! as a [`SyncReport`] with [`RunOutcome::Failed`]. Nothing here returns an
//! error to the caller, so one broken source cannot stop the backup loop.

use crate::config::OptionValue;
use crate::scheduler::state::RunOutcome;
use crate::sync::command::SyncCommand;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

/// Result of one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// SUCCESS or FAILED.
    pub outcome: RunOutcome,
    /// Exit code when the tool ran to completion.
    pub exit_code: Option<i32>,
    /// stdout lines on success; stderr lines (or a launch error) on failure.
    pub output: Vec<String>,
}

impl SyncReport {
    /// Successful attempt with captured stdout.
    #[must_use]
    pub fn success(output: Vec<String>) -> Self {
        Self {
            outcome: RunOutcome::Success,
            exit_code: Some(0),
            output,
        }
    }

    /// Failed attempt.
    #[must_use]
    pub fn failure(exit_code: Option<i32>, output: Vec<String>) -> Self {
        Self {
            outcome: RunOutcome::Failed,
            exit_code,
            output,
        }
    }
}

/// Executes one sync per source.
#[async_trait]
pub trait SyncInvoker: Send + Sync {
    /// Name used to prefix captured output in logs.
    fn tool_name(&self) -> &str;

    /// Sync `source` into `destination` with `options`. Never fails; all
    /// problems are reported as [`RunOutcome::Failed`].
    async fn invoke(
        &self,
        source: &str,
        destination: &Path,
        options: &IndexMap<String, OptionValue>,
    ) -> SyncReport;
}

/// [`SyncInvoker`] backed by an external rsync-compatible program.
#[derive(Debug, Clone)]
pub struct RsyncInvoker {
    program: String,
}

impl RsyncInvoker {
    /// Create an invoker for `program` (a bare name looked up on `PATH`, or a path).
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Sync`](crate::error::BackupError::Sync) when
    /// `program` is blank.
    pub fn new(program: impl Into<String>) -> crate::error::Result<Self> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(crate::error::BackupError::Sync(
                "sync tool program must not be empty".to_owned(),
            ));
        }
        Ok(Self { program })
    }

    fn resolve_program(&self) -> Result<PathBuf, String> {
        which::which(&self.program)
            .map_err(|e| format!("cannot locate sync tool '{}': {e}", self.program))
    }
}

#[async_trait]
impl SyncInvoker for RsyncInvoker {
    fn tool_name(&self) -> &str {
        Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.program)
    }

    async fn invoke(
        &self,
        source: &str,
        destination: &Path,
        options: &IndexMap<String, OptionValue>,
    ) -> SyncReport {
        let command = SyncCommand::new(&self.program, options, source, destination);
        debug!(command = %command.render(), "launching sync tool");

        let program = match self.resolve_program() {
            Ok(path) => path,
            Err(msg) => return SyncReport::failure(None, vec![msg]),
        };

        let mut child = match tokio::process::Command::new(&program)
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return SyncReport::failure(
                    None,
                    vec![format!("failed to spawn '{}': {e}", program.display())],
                );
            }
        };

        let tool = self.tool_name().to_owned();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdout_lines, stderr_lines, status) = tokio::join!(
            collect_lines(stdout, &tool, "stdout"),
            collect_lines(stderr, &tool, "stderr"),
            child.wait(),
        );

        match status {
            Ok(status) if status.success() => SyncReport::success(stdout_lines),
            Ok(status) => {
                let mut output = stderr_lines;
                if status.code().is_none() {
                    output.push(format!("{tool} terminated without an exit code ({status})"));
                }
                SyncReport::failure(status.code(), output)
            }
            Err(e) => SyncReport::failure(None, vec![format!("failed to wait for {tool}: {e}")]),
        }
    }
}

/// Drain a child stream line by line. Invalid UTF-8 is replaced, not fatal,
/// so the pipe is always read to EOF.
async fn collect_lines<R>(stream: Option<R>, tool: &str, stream_name: &str) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return Vec::new();
    };

    let mut reader = BufReader::new(stream);
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\n', '\r'])
                    .to_owned();
                debug!("[{tool} {stream_name}] {line}");
                lines.push(line);
            }
            Err(e) => {
                lines.push(format!("failed to read {tool} {stream_name}: {e}"));
                break;
            }
        }
    }
    lines
}
