use std::{collections::BTreeMap, ffi::OsString, path::PathBuf};

use turbostat_events::IngestLimits;

use crate::command::TurbostatCommand;

/// Environment variable consulted when no binary is configured explicitly.
pub const BINARY_ENV: &str = "TURBOSTAT_BINARY";

/// What happens to the child's stderr.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum StderrMode {
    /// Share the parent's stderr, as the standalone converter does.
    #[default]
    Inherit,
    /// Pipe stderr and log every line at info level.
    Log,
}

#[derive(Debug, Clone, Default)]
pub struct TurbostatBuilder {
    pub(crate) binary: Option<PathBuf>,
    pub(crate) args: Vec<OsString>,
    pub(crate) working_dir: Option<PathBuf>,
    pub(crate) env: BTreeMap<String, String>,
    pub(crate) limits: IngestLimits,
    pub(crate) stderr: StderrMode,
}

impl TurbostatBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Appends one argument, forwarded verbatim.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn limits(mut self, limits: IngestLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn stderr(mut self, mode: StderrMode) -> Self {
        self.stderr = mode;
        self
    }

    pub fn build(self) -> TurbostatCommand {
        let binary = self.binary.unwrap_or_else(default_binary);
        TurbostatCommand {
            binary,
            args: self.args,
            working_dir: self.working_dir,
            env: self.env,
            limits: self.limits,
            stderr: self.stderr,
        }
    }
}

fn default_binary() -> PathBuf {
    if let Ok(v) = std::env::var(BINARY_ENV) {
        if !v.trim().is_empty() {
            return PathBuf::from(v);
        }
    }
    PathBuf::from("turbostat")
}
