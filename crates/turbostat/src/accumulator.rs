use std::{
    collections::BTreeMap,
    io::{self, Write},
    sync::{Arc, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::warn;
use turbostat_events::{Metric, Record, RecordSink};

/// Destination for structured metrics, typically owned by the agent host.
///
/// Implementations must tolerate calls from several tasks at once.
pub trait Accumulator: Send + Sync {
    fn add_fields(
        &self,
        measurement: &str,
        fields: BTreeMap<String, f64>,
        tags: BTreeMap<String, String>,
    );
}

impl<A: Accumulator + ?Sized> Accumulator for Arc<A> {
    fn add_fields(
        &self,
        measurement: &str,
        fields: BTreeMap<String, f64>,
        tags: BTreeMap<String, String>,
    ) {
        (**self).add_fields(measurement, fields, tags);
    }
}

/// Record sink that forwards every record to an [`Accumulator`].
#[derive(Debug)]
pub struct AccumulatorSink<A> {
    accumulator: A,
}

impl<A: Accumulator> AccumulatorSink<A> {
    pub fn new(accumulator: A) -> Self {
        Self { accumulator }
    }
}

impl<A: Accumulator> RecordSink for AccumulatorSink<A> {
    fn emit(&mut self, record: Record) -> io::Result<()> {
        let metric = record.to_metric();
        self.accumulator
            .add_fields(&metric.name, metric.fields, metric.tags);
        Ok(())
    }
}

/// Accumulator that timestamps metrics and writes them as line protocol,
/// one per line. This is what an exec-style agent shim reads from stdout.
#[derive(Debug)]
pub struct LineProtocolAccumulator<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> LineProtocolAccumulator<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Accumulator for LineProtocolAccumulator<W> {
    fn add_fields(
        &self,
        measurement: &str,
        fields: BTreeMap<String, f64>,
        tags: BTreeMap<String, String>,
    ) {
        let line = Metric::new(measurement, tags, fields)
            .with_timestamp(unix_nanos())
            .to_line_protocol();
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let written = writeln!(writer, "{line}").and_then(|()| writer.flush());
        if let Err(err) = written {
            warn!("failed to write metric: {err}");
        }
    }
}

fn unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
