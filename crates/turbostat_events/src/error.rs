use std::io;

use thiserror::Error;

/// Reasons a single data row cannot be turned into a record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("too many values: keys={keys:?}, values={values:?}")]
    TooManyValues {
        keys: Vec<String>,
        values: Vec<String>,
    },
    #[error("invalid tag value for `{key}`: {value:?}")]
    InvalidTag { key: String, value: String },
    #[error("invalid field value for `{key}`: {value:?}")]
    InvalidField { key: String, value: String },
    #[error("no value for any field: keys={keys:?}, values={values:?}")]
    NoField {
        keys: Vec<String>,
        values: Vec<String>,
    },
}

/// Fatal conditions that stop processing of a whole stream.
///
/// Clean end of input is not an error; see [`crate::StreamEnd`].
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream ended before a header line was read")]
    MissingHeader,
    #[error("I/O error while reading line {line_number}: {source}")]
    Io {
        line_number: usize,
        #[source]
        source: io::Error,
    },
    #[error("line {line_number} is not valid UTF-8")]
    InvalidUtf8 { line_number: usize },
    #[error(
        "line {line_number} too long (observed_bytes={observed_bytes}, max_line_bytes={max_line_bytes})"
    )]
    LineTooLong {
        line_number: usize,
        observed_bytes: usize,
        max_line_bytes: usize,
    },
    #[error("line {line_number}: {source}")]
    Row {
        line_number: usize,
        #[source]
        source: RowError,
    },
    #[error("failed to emit record for line {line_number}: {source}")]
    Sink {
        line_number: usize,
        #[source]
        source: io::Error,
    },
}

impl StreamError {
    /// 1-based line number the error refers to, when there is one.
    pub fn line_number(&self) -> Option<usize> {
        match self {
            StreamError::MissingHeader => None,
            StreamError::Io { line_number, .. }
            | StreamError::InvalidUtf8 { line_number }
            | StreamError::LineTooLong { line_number, .. }
            | StreamError::Row { line_number, .. }
            | StreamError::Sink { line_number, .. } => Some(*line_number),
        }
    }

    /// Returns the row-level cause, if this error came from classification.
    pub fn row_error(&self) -> Option<&RowError> {
        match self {
            StreamError::Row { source, .. } => Some(source),
            _ => None,
        }
    }
}
