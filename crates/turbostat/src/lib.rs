#![forbid(unsafe_code)]
//! Runs `turbostat` as a child process and forwards its samples.
//!
//! The conversion itself lives in [`turbostat_events`]; this crate adds the
//! process glue around it:
//! - [`TurbostatBuilder`] / [`TurbostatCommand`] configure and spawn the child.
//! - [`Session`] drains stdout (metrics) and stderr (log lines) concurrently
//!   and tears everything down on the first fatal error or on cancellation.
//! - [`TurbostatPlugin`] wraps a session in the `start`/`stop` lifecycle an
//!   agent host expects, feeding an [`Accumulator`].

mod accumulator;
mod builder;
mod command;
mod error;
pub mod logging;
mod plugin;
mod process;
mod session;
pub mod shutdown;

pub use accumulator::{Accumulator, AccumulatorSink, LineProtocolAccumulator};
pub use builder::{StderrMode, TurbostatBuilder, BINARY_ENV};
pub use command::TurbostatCommand;
pub use error::TurbostatError;
pub use plugin::TurbostatPlugin;
pub use session::{Session, SessionReport};

pub use turbostat_events::{
    IngestLimits, JsonWriter, LineProtocolWriter, Metric, Record, RecordSink, StreamError,
    StreamSummary, MEASUREMENT,
};
