#![forbid(unsafe_code)]
//! Line-to-metric pipeline for `turbostat` output.
//!
//! `turbostat` prints a tab-separated header row followed by data rows, and
//! re-prints the header periodically. This crate provides:
//! - [`sanitize_key`], turning header columns into stable snake case keys.
//! - [`RowClassifier`], splitting rows into tags and numeric fields.
//! - A bounded-memory ingestion loop ([`LineIngestor`], sync + optional tokio)
//!   that feeds every record into a [`RecordSink`].
//!
//! It never spawns or manages the monitored command itself; callers hand it a
//! byte stream.

mod classifier;
mod config;
mod error;
mod ingest;
mod key;
mod metric;
mod reader;
mod row;
mod sink;

pub use classifier::{ClassifierState, Header, RowClassifier};
pub use config::IngestLimits;
pub use error::{RowError, StreamError};
pub use ingest::{process_stream, LineIngestor, StreamEnd, StreamSummary};
pub use key::sanitize_key;
pub use metric::{LineProtocol, Metric, MEASUREMENT};
pub use reader::{BoundedLine, SyncBoundedLineReader};
pub use row::{classify_row, is_tag_key, is_tag_value, Field, Record, Tag, TAG_KEYS};
pub use sink::{JsonWriter, LineProtocolWriter, RecordSink};

#[cfg(feature = "tokio")]
pub use ingest::process_stream_async;

#[cfg(feature = "tokio")]
pub use reader::AsyncBoundedLineReader;
