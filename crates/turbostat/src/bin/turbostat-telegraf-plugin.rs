use std::{ffi::OsString, io, path::PathBuf, process::ExitCode, sync::Arc};

use clap::{error::ErrorKind, Parser};
use tracing::{error, info};
use turbostat::{
    logging,
    shutdown::{wait_for_shutdown, ShutdownReason},
    LineProtocolAccumulator, StderrMode, TurbostatCommand, TurbostatPlugin,
};

/// Runs turbostat as an exec-style agent input: metrics go to stdout as
/// timestamped line protocol, diagnostics go to stderr.
#[derive(Debug, Parser)]
#[command(name = "turbostat-telegraf-plugin")]
struct Cli {
    /// Keep running after stdin is closed.
    #[arg(long)]
    ignore_stdin: bool,

    /// turbostat executable followed by its arguments.
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<OsString>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };
    logging::init("turbostat=info");

    let mut words = cli.command.into_iter();
    let Some(binary) = words.next() else {
        return ExitCode::FAILURE;
    };
    let command = TurbostatCommand::builder()
        .binary(PathBuf::from(binary))
        .args(words)
        .stderr(StderrMode::Log)
        .build();

    let mut plugin = TurbostatPlugin::new(command);
    if let Err(err) = plugin.start(Arc::new(LineProtocolAccumulator::new(io::stdout()))) {
        error!("failed to start turbostat: {err}");
        return ExitCode::FAILURE;
    }

    match wait_for_shutdown(!cli.ignore_stdin).await {
        Ok(ShutdownReason::StdinClosed) => info!("stdin closed, shutting down"),
        Ok(reason) => info!(?reason, "shutdown signal received"),
        Err(err) => error!("failed to install signal handlers: {err}"),
    }
    plugin.stop().await;
    ExitCode::SUCCESS
}
