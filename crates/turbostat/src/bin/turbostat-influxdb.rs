use std::{ffi::OsString, io, path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use tracing::debug;
use turbostat::{
    logging, JsonWriter, LineProtocolWriter, StderrMode, TurbostatCommand, TurbostatError,
    BINARY_ENV,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// InfluxDB line protocol, one record per line.
    Influx,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "turbostat-influxdb")]
#[command(about = "Run turbostat and print its samples as InfluxDB line protocol")]
// `-h`/`--help` belong to turbostat.
#[command(disable_help_flag = true)]
struct Cli {
    /// turbostat executable to run.
    #[arg(long, env = BINARY_ENV, default_value = "turbostat")]
    binary: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Influx)]
    format: Format,

    /// Arguments forwarded to turbostat unchanged.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<OsString>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init("turbostat=info");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("turbostat-influxdb: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), TurbostatError> {
    let command = TurbostatCommand::builder()
        .binary(cli.binary)
        .args(cli.args)
        .stderr(StderrMode::Inherit)
        .build();

    let session = match cli.format {
        Format::Influx => command.spawn(LineProtocolWriter::new(io::stdout()))?,
        Format::Json => command.spawn(JsonWriter::new(io::stdout()))?,
    };
    let report = session.wait().await?;
    debug!(
        records = report.stream.records,
        repeated_headers = report.stream.repeated_headers,
        "turbostat finished"
    );
    Ok(())
}
