use std::{
    collections::BTreeMap,
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use turbostat_events::{IngestLimits, LineIngestor, RecordSink};

use crate::{
    builder::{StderrMode, TurbostatBuilder},
    process::{apply_env, drain_stderr, drain_stdout, log_stderr_line, spawn_with_retry},
    session::{supervise, Session},
    TurbostatError,
};

/// A fully configured turbostat invocation. Cheap to clone and reusable.
#[derive(Debug, Clone)]
pub struct TurbostatCommand {
    pub(crate) binary: PathBuf,
    pub(crate) args: Vec<OsString>,
    pub(crate) working_dir: Option<PathBuf>,
    pub(crate) env: BTreeMap<String, String>,
    pub(crate) limits: IngestLimits,
    pub(crate) stderr: StderrMode,
}

impl TurbostatCommand {
    pub fn builder() -> TurbostatBuilder {
        TurbostatBuilder::default()
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn limits(&self) -> IngestLimits {
        self.limits
    }

    pub fn stderr_mode(&self) -> StderrMode {
        self.stderr
    }

    /// Spawns turbostat and starts draining its output into `sink`.
    ///
    /// Returns as soon as the child is running. Must be called from within a
    /// tokio runtime.
    pub fn spawn<S>(&self, sink: S) -> Result<Session, TurbostatError>
    where
        S: RecordSink + Send + 'static,
    {
        self.spawn_with_token(sink, CancellationToken::new())
    }

    /// Like [`TurbostatCommand::spawn`], but observes a caller-provided
    /// token. Cancelling it kills the child and unwinds both drain loops.
    pub fn spawn_with_token<S>(
        &self,
        sink: S,
        cancel: CancellationToken,
    ) -> Result<Session, TurbostatError>
    where
        S: RecordSink + Send + 'static,
    {
        let mut command = Command::new(&self.binary);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(match self.stderr {
                StderrMode::Inherit => Stdio::inherit(),
                StderrMode::Log => Stdio::piped(),
            })
            .kill_on_drop(true);
        if let Some(dir) = self.working_dir.as_ref() {
            command.current_dir(dir);
        }
        apply_env(&mut command, &self.env);

        let mut child = spawn_with_retry(&mut command, &self.binary)?;
        let pid = child.id();
        debug!(binary = %self.binary.display(), ?pid, "spawned turbostat");

        let stdout = child
            .stdout
            .take()
            .ok_or(TurbostatError::StdoutUnavailable)?;
        let stderr = match self.stderr {
            StderrMode::Inherit => None,
            StderrMode::Log => Some(
                child
                    .stderr
                    .take()
                    .ok_or(TurbostatError::StderrUnavailable)?,
            ),
        };

        let stdout_task = tokio::spawn(drain_stdout(
            stdout,
            sink,
            LineIngestor::new(self.limits),
            cancel.clone(),
        ));
        let stderr_task = stderr.map(|stderr| {
            tokio::spawn(drain_stderr(
                stderr,
                self.limits.max_line_bytes,
                cancel.clone(),
                log_stderr_line,
            ))
        });
        let supervisor = tokio::spawn(supervise(child, stdout_task, stderr_task, cancel.clone()));

        Ok(Session::new(pid, cancel, supervisor))
    }
}
