use std::io::Read;

use tracing::{debug, trace};

use crate::classifier::{ClassifierState, RowClassifier};
use crate::config::IngestLimits;
use crate::error::StreamError;
use crate::reader::{BoundedLine, SyncBoundedLineReader};
use crate::sink::RecordSink;

/// How a stream stopped when no error occurred.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StreamEnd {
    /// The source was closed. This is the normal way for a stream to end.
    Exhausted,
    /// The caller's cancellation token fired first.
    Cancelled,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct StreamSummary {
    /// Lines read, including the header and its repeats.
    pub lines: usize,
    pub records: usize,
    pub repeated_headers: usize,
    pub end: StreamEnd,
}

/// Drives a [`RowClassifier`] over a byte stream and feeds a [`RecordSink`].
///
/// Any row that cannot be classified stops the stream: a single malformed row
/// means the header/row alignment can no longer be trusted.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineIngestor {
    limits: IngestLimits,
}

impl LineIngestor {
    pub fn new(limits: IngestLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> IngestLimits {
        self.limits
    }

    /// Processes `reader` until it is exhausted or a fatal error occurs.
    pub fn process<R, S>(&self, reader: R, sink: &mut S) -> Result<StreamSummary, StreamError>
    where
        R: Read,
        S: RecordSink + ?Sized,
    {
        let mut lines = SyncBoundedLineReader::new(reader, self.limits.max_line_bytes);
        let mut pipeline = RowPipeline::default();
        loop {
            let line_number = lines.pending_line_number();
            match lines.next_line() {
                Ok(Some(line)) => pipeline.accept(line, sink)?,
                Ok(None) => return pipeline.finish(StreamEnd::Exhausted),
                Err(source) => return Err(StreamError::Io { line_number, source }),
            }
        }
    }

    /// Async flavor of [`LineIngestor::process`] that also stops once
    /// `cancel` fires.
    #[cfg(feature = "tokio")]
    pub async fn process_async<R, S>(
        &self,
        reader: R,
        sink: &mut S,
        cancel: &tokio_util::sync::CancellationToken,
    ) -> Result<StreamSummary, StreamError>
    where
        R: tokio::io::AsyncRead + Unpin,
        S: RecordSink + ?Sized,
    {
        let mut lines =
            crate::reader::AsyncBoundedLineReader::new(reader, self.limits.max_line_bytes);
        let mut pipeline = RowPipeline::default();
        loop {
            let line_number = lines.pending_line_number();
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return pipeline.finish(StreamEnd::Cancelled),
                next = lines.next_line() => next,
            };
            match next {
                Ok(Some(line)) => pipeline.accept(line, sink)?,
                Ok(None) => return pipeline.finish(StreamEnd::Exhausted),
                Err(source) => return Err(StreamError::Io { line_number, source }),
            }
        }
    }
}

/// Processes a blocking stream with default limits.
pub fn process_stream<R, S>(reader: R, sink: &mut S) -> Result<StreamSummary, StreamError>
where
    R: Read,
    S: RecordSink + ?Sized,
{
    LineIngestor::default().process(reader, sink)
}

/// Processes an async stream with default limits until it ends or `cancel` fires.
#[cfg(feature = "tokio")]
pub async fn process_stream_async<R, S>(
    reader: R,
    sink: &mut S,
    cancel: &tokio_util::sync::CancellationToken,
) -> Result<StreamSummary, StreamError>
where
    R: tokio::io::AsyncRead + Unpin,
    S: RecordSink + ?Sized,
{
    LineIngestor::default()
        .process_async(reader, sink, cancel)
        .await
}

#[derive(Debug, Default)]
struct RowPipeline {
    classifier: RowClassifier,
    lines: usize,
    records: usize,
    repeated_headers: usize,
}

impl RowPipeline {
    fn accept<S>(&mut self, line: BoundedLine, sink: &mut S) -> Result<(), StreamError>
    where
        S: RecordSink + ?Sized,
    {
        let (line_number, bytes) = match line {
            BoundedLine::Line { line_number, bytes } => (line_number, bytes),
            BoundedLine::LineTooLong {
                line_number,
                observed_bytes,
                max_line_bytes,
            } => {
                return Err(StreamError::LineTooLong {
                    line_number,
                    observed_bytes,
                    max_line_bytes,
                })
            }
        };
        self.lines = line_number;

        let Ok(raw_line) = String::from_utf8(bytes) else {
            return Err(StreamError::InvalidUtf8 { line_number });
        };
        let line = raw_line.strip_suffix('\r').unwrap_or(&raw_line);

        let had_header = self.classifier.state() == ClassifierState::StreamingRows;
        let parsed = self
            .classifier
            .parse_line(line)
            .map_err(|source| StreamError::Row {
                line_number,
                source,
            })?;
        match parsed {
            Some(record) => {
                sink.emit(record).map_err(|source| StreamError::Sink {
                    line_number,
                    source,
                })?;
                self.records += 1;
            }
            None if had_header => {
                trace!(line_number, "skipping repeated header");
                self.repeated_headers += 1;
            }
            None => {}
        }
        Ok(())
    }

    fn finish(self, end: StreamEnd) -> Result<StreamSummary, StreamError> {
        if end == StreamEnd::Exhausted && self.classifier.header().is_none() {
            return Err(StreamError::MissingHeader);
        }
        let summary = StreamSummary {
            lines: self.lines,
            records: self.records,
            repeated_headers: self.repeated_headers,
            end,
        };
        debug!(?summary, "turbostat stream ended");
        Ok(summary)
    }
}
