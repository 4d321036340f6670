use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::row::Record;

/// Measurement name shared by every emitted record.
pub const MEASUREMENT: &str = "turbostat";

/// Line-protocol rendering of a [`Record`], keeping the raw field text.
///
/// Tags and fields are written in column order. A record without tags is
/// rendered as `turbostat <fields>`.
#[derive(Debug, Clone, Copy)]
pub struct LineProtocol<'a> {
    record: &'a Record,
}

impl<'a> LineProtocol<'a> {
    pub(crate) fn new(record: &'a Record) -> Self {
        Self { record }
    }
}

impl fmt::Display for LineProtocol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MEASUREMENT)?;
        for tag in &self.record.tags {
            write!(f, ",{}={}", tag.key, tag.value)?;
        }
        for (idx, field) in self.record.fields.iter().enumerate() {
            let sep = if idx == 0 { ' ' } else { ',' };
            write!(f, "{sep}{}={}", field.key, field.raw)?;
        }
        Ok(())
    }
}

/// Structured form of a record, as handed to a metrics accumulator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, f64>,
    /// Nanoseconds since the Unix epoch, set by whoever accumulates the metric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl Metric {
    pub fn new(
        name: impl Into<String>,
        tags: BTreeMap<String, String>,
        fields: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            name: name.into(),
            tags,
            fields,
            timestamp: None,
        }
    }

    pub(crate) fn from_record(record: &Record) -> Self {
        let tags = record
            .tags
            .iter()
            .map(|tag| (tag.key.clone(), tag.value.clone()))
            .collect();
        let fields = record
            .fields
            .iter()
            .map(|field| (field.key.clone(), field.value))
            .collect();
        Self::new(MEASUREMENT, tags, fields)
    }

    pub fn with_timestamp(mut self, nanos: u64) -> Self {
        self.timestamp = Some(nanos);
        self
    }

    /// Renders the metric as one line of line protocol, keys sorted.
    pub fn to_line_protocol(&self) -> String {
        let mut line = self.name.clone();
        for (key, value) in &self.tags {
            line.push_str(&format!(",{key}={value}"));
        }
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        line.push(' ');
        line.push_str(&fields.join(","));
        if let Some(ts) = self.timestamp {
            line.push_str(&format!(" {ts}"));
        }
        line
    }
}
