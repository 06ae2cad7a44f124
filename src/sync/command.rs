//! Sync tool command line construction.

use crate::config::OptionValue;
use indexmap::IndexMap;
use std::ffi::OsString;
use std::path::PathBuf;

/// One fully-specified sync tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCommand {
    program: String,
    flags: Vec<(String, Option<String>)>,
    source: String,
    destination: PathBuf,
}

impl SyncCommand {
    /// Build the invocation for `source` → `destination` with `options`
    /// rendered in map order. Disabled (`false`) flags are dropped.
    pub fn new(
        program: impl Into<String>,
        options: &IndexMap<String, OptionValue>,
        source: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        let flags = options
            .iter()
            .filter(|(_, value)| value.is_enabled())
            .map(|(flag, value)| (flag.clone(), value.value()))
            .collect();
        Self {
            program: program.into(),
            flags,
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Argument vector passed to the child process (no shell involved).
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = self
            .flags
            .iter()
            .map(|(flag, value)| match value {
                Some(v) => OsString::from(format!("{flag}={v}")),
                None => OsString::from(flag),
            })
            .collect();
        args.push(OsString::from(&self.source));
        args.push(self.destination.clone().into_os_string());
        args
    }

    /// Printable shell-style command line, e.g. `rsync --exclude="*.tmp" -a SRC DEST`.
    pub fn render(&self) -> String {
        let mut line = self.program.clone();
        for (flag, value) in &self.flags {
            line.push(' ');
            match value {
                Some(v) => line.push_str(&format!("{flag}=\"{v}\"")),
                None => line.push_str(flag),
            }
        }
        line.push_str(&format!(" {} {}", self.source, self.destination.display()));
        line
    }
}
