use std::{io, process::ExitStatus};

use tokio::{process::Child, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use turbostat_events::{StreamError, StreamSummary};

use crate::TurbostatError;

/// Outcome of a session that ended without a fatal error.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub status: ExitStatus,
    pub stream: StreamSummary,
    /// Lines read from stderr, when stderr was piped.
    pub stderr_lines: Option<usize>,
    /// The session was stopped through its cancellation token.
    pub cancelled: bool,
}

/// A running turbostat child plus its stdout/stderr drain loops.
#[derive(Debug)]
pub struct Session {
    pid: Option<u32>,
    cancel: CancellationToken,
    supervisor: JoinHandle<Result<SessionReport, TurbostatError>>,
}

impl Session {
    pub(crate) fn new(
        pid: Option<u32>,
        cancel: CancellationToken,
        supervisor: JoinHandle<Result<SessionReport, TurbostatError>>,
    ) -> Self {
        Self {
            pid,
            cancel,
            supervisor,
        }
    }

    /// OS process id of the child, if it was still known at spawn time.
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Kills the child and stops both drain loops. Does not wait.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.supervisor.is_finished()
    }

    /// Waits for the child to exit and both loops to unwind.
    ///
    /// A stdout processing error takes precedence over the child's exit
    /// status, since the child is killed in response to it.
    pub async fn wait(self) -> Result<SessionReport, TurbostatError> {
        self.supervisor.await?
    }
}

pub(crate) async fn supervise(
    mut child: Child,
    stdout_task: JoinHandle<Result<StreamSummary, StreamError>>,
    stderr_task: Option<JoinHandle<io::Result<usize>>>,
    cancel: CancellationToken,
) -> Result<SessionReport, TurbostatError> {
    let waited = tokio::select! {
        status = child.wait() => status,
        _ = cancel.cancelled() => {
            debug!("cancellation requested, stopping turbostat");
            if let Err(err) = child.start_kill() {
                warn!("failed to signal turbostat: {err}");
            }
            child.wait().await
        }
    };
    let status = waited.map_err(|source| TurbostatError::Wait { source })?;
    debug!(%status, "turbostat exited");

    let stdout = stdout_task.await?;
    let stderr = match stderr_task {
        Some(task) => Some(task.await?),
        None => None,
    };
    let cancelled = cancel.is_cancelled();

    let stream = match stdout {
        Ok(summary) => summary,
        // No header at all usually means turbostat failed to start up; its
        // exit status says more than the empty stream does.
        Err(StreamError::MissingHeader) if !cancelled && !status.success() => {
            return Err(TurbostatError::NonZeroExit { status })
        }
        Err(err) => return Err(err.into()),
    };
    let stderr_lines = stderr.transpose().map_err(TurbostatError::StderrRead)?;

    if !cancelled && !status.success() {
        return Err(TurbostatError::NonZeroExit { status });
    }
    Ok(SessionReport {
        status,
        stream,
        stderr_lines,
        cancelled,
    })
}
