use std::{collections::BTreeMap, io, path::Path, time::Duration};

use tokio::{io::AsyncRead, process::Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use turbostat_events::{
    AsyncBoundedLineReader, BoundedLine, LineIngestor, RecordSink, StreamError, StreamSummary,
};

use crate::TurbostatError;

const SPAWN_ATTEMPTS: u32 = 5;
const MAX_SPAWN_BACKOFF: Duration = Duration::from_millis(50);

/// Spawns `command`, retrying briefly while the binary is still open for
/// writing (`ETXTBSY`), which happens right after a script is written.
pub(crate) fn spawn_with_retry(
    command: &mut Command,
    binary: &Path,
) -> Result<tokio::process::Child, TurbostatError> {
    let mut backoff = Duration::from_millis(2);
    let mut attempts_left = SPAWN_ATTEMPTS;
    loop {
        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(source) if attempts_left > 1 && is_text_file_busy(&source) => {
                attempts_left -= 1;
                debug!(binary = %binary.display(), "turbostat binary busy, retrying spawn");
                std::thread::sleep(backoff);
                backoff = (backoff * 2).min(MAX_SPAWN_BACKOFF);
            }
            Err(source) => {
                return Err(TurbostatError::Spawn {
                    binary: binary.to_path_buf(),
                    source,
                })
            }
        }
    }
}

// ETXTBSY on Linux.
fn is_text_file_busy(err: &io::Error) -> bool {
    err.raw_os_error() == Some(26)
}

pub(crate) fn apply_env(command: &mut Command, env: &BTreeMap<String, String>) {
    for (k, v) in env {
        command.env(k, v);
    }
}

/// Feeds the child's stdout through the record pipeline.
///
/// A fatal stream error cancels `cancel` so the child and the stderr loop
/// are torn down too.
pub(crate) async fn drain_stdout<R, S>(
    stdout: R,
    mut sink: S,
    ingestor: LineIngestor,
    cancel: CancellationToken,
) -> Result<StreamSummary, StreamError>
where
    R: AsyncRead + Unpin,
    S: RecordSink,
{
    let result = ingestor.process_async(stdout, &mut sink, &cancel).await;
    match &result {
        Ok(summary) => debug!(
            records = summary.records,
            end = ?summary.end,
            "turbostat stdout drained"
        ),
        Err(err) => {
            error!("error processing stdout: {err}");
            cancel.cancel();
        }
    }
    result
}

/// Hands every stderr line to `on_line` verbatim. Returns the line count.
pub(crate) async fn drain_stderr<R, F>(
    stderr: R,
    max_line_bytes: usize,
    cancel: CancellationToken,
    mut on_line: F,
) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut lines = AsyncBoundedLineReader::new(stderr, max_line_bytes);
    let mut count = 0;
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(count),
            next = lines.next_line() => next,
        };
        match next {
            Ok(Some(BoundedLine::Line { bytes, .. })) => {
                let text = String::from_utf8_lossy(&bytes);
                on_line(text.strip_suffix('\r').unwrap_or(&text));
                count += 1;
            }
            Ok(Some(BoundedLine::LineTooLong { observed_bytes, .. })) => {
                on_line(&format!("<{observed_bytes} byte line truncated>"));
                count += 1;
            }
            Ok(None) => return Ok(count),
            Err(err) => {
                error!("error processing stderr: {err}");
                cancel.cancel();
                return Err(err);
            }
        }
    }
}

pub(crate) fn log_stderr_line(line: &str) {
    info!(target: "turbostat::stderr", "{line}");
}
