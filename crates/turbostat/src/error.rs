use std::{path::PathBuf, process::ExitStatus};

use thiserror::Error;
use turbostat_events::StreamError;

/// Errors that may occur while running turbostat and draining its output.
#[derive(Debug, Error)]
pub enum TurbostatError {
    #[error("turbostat binary `{binary}` could not be spawned: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to wait for turbostat process: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },
    #[error("turbostat exited with {status}")]
    NonZeroExit { status: ExitStatus },
    #[error("error processing stdout: {0}")]
    Stream(#[from] StreamError),
    #[error("error processing stderr: {0}")]
    StderrRead(#[source] std::io::Error),
    #[error("turbostat stdout unavailable")]
    StdoutUnavailable,
    #[error("turbostat stderr unavailable")]
    StderrUnavailable,
    #[error("failed to join turbostat output task: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("plugin is already running")]
    AlreadyStarted,
}
