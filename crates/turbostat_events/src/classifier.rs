use tracing::debug;

use crate::error::RowError;
use crate::key::sanitize_key;
use crate::row::{classify_row, Record};

const DELIMITER: char = '\t';

/// The first line of a stream and the sanitized keys derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    line: String,
    keys: Vec<String>,
}

impl Header {
    pub fn parse(line: &str) -> Self {
        Self {
            line: line.to_string(),
            keys: line.split(DELIMITER).map(sanitize_key).collect(),
        }
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// `turbostat` re-prints its header verbatim every so often.
    pub fn is_repeat(&self, line: &str) -> bool {
        self.line == line
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ClassifierState {
    AwaitingHeader,
    StreamingRows,
}

/// Turns successive lines of one stream into records.
///
/// The first line is captured as the [`Header`]; afterwards every line is
/// either a repeated header (skipped) or a data row.
#[derive(Debug, Clone, Default)]
pub struct RowClassifier {
    header: Option<Header>,
}

impl RowClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ClassifierState {
        match self.header {
            None => ClassifierState::AwaitingHeader,
            Some(_) => ClassifierState::StreamingRows,
        }
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Parses one logical line (without its line terminator).
    ///
    /// Returns `Ok(None)` for the header line and its repeats.
    pub fn parse_line(&mut self, line: &str) -> Result<Option<Record>, RowError> {
        let Some(header) = self.header.as_ref() else {
            let header = Header::parse(line);
            debug!(keys = ?header.keys(), "captured turbostat header");
            self.header = Some(header);
            return Ok(None);
        };

        if header.is_repeat(line) {
            return Ok(None);
        }

        let values: Vec<&str> = line.split(DELIMITER).collect();
        classify_row(header.keys(), &values).map(Some)
    }
}
