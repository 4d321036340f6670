use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    accumulator::{Accumulator, AccumulatorSink},
    command::TurbostatCommand,
    session::Session,
    TurbostatError,
};

/// Agent-plugin flavor: runs turbostat in the background and feeds an
/// [`Accumulator`] until stopped.
///
/// Failures never propagate to the host. They are logged, the child is
/// killed, and the plugin simply stops producing metrics.
#[derive(Debug)]
pub struct TurbostatPlugin {
    command: TurbostatCommand,
    running: Option<Running>,
}

#[derive(Debug)]
struct Running {
    cancel: CancellationToken,
    monitor: JoinHandle<()>,
}

impl TurbostatPlugin {
    pub fn new(command: TurbostatCommand) -> Self {
        Self {
            command,
            running: None,
        }
    }

    /// Spawns the child and its drain loops, then returns without waiting.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<A>(&mut self, accumulator: A) -> Result<(), TurbostatError>
    where
        A: Accumulator + 'static,
    {
        if self.is_running() {
            return Err(TurbostatError::AlreadyStarted);
        }

        let session = self.command.spawn(AccumulatorSink::new(accumulator))?;
        info!(pid = ?session.id(), "turbostat plugin started");
        let cancel = session.cancellation_token();
        let monitor = tokio::spawn(monitor(session));
        self.running = Some(Running { cancel, monitor });
        Ok(())
    }

    /// Whether the child is still being supervised.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.monitor.is_finished())
    }

    /// Kills the child and waits for both loops to unwind. Idempotent.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        running.cancel.cancel();
        if let Err(err) = running.monitor.await {
            warn!("turbostat monitor task failed: {err}");
        }
    }
}

async fn monitor(session: Session) {
    match session.wait().await {
        Ok(report) if report.cancelled => {
            info!(records = report.stream.records, "metrics emission stopped");
            return;
        }
        Ok(report) => warn!(
            status = %report.status,
            records = report.stream.records,
            "turbostat exited"
        ),
        Err(err) => error!("child process stopped: {err}"),
    }
    error!("metrics emission stopped");
}
