use std::io::{self, Write};

use crate::row::Record;

/// Receives every record the pipeline produces, in stream order.
///
/// This is the only thing that differs between the text converter and the
/// structured (accumulator) flavor; the classification is shared.
pub trait RecordSink {
    fn emit(&mut self, record: Record) -> io::Result<()>;
}

impl RecordSink for Vec<Record> {
    fn emit(&mut self, record: Record) -> io::Result<()> {
        self.push(record);
        Ok(())
    }
}

/// Writes one line of line protocol per record and flushes after each one,
/// so a downstream reader sees samples as soon as they arrive.
#[derive(Debug)]
pub struct LineProtocolWriter<W: Write> {
    writer: W,
}

impl<W: Write> LineProtocolWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for LineProtocolWriter<W> {
    fn emit(&mut self, record: Record) -> io::Result<()> {
        writeln!(self.writer, "{}", record.line_protocol())?;
        self.writer.flush()
    }
}

/// Writes each record as a single-line JSON [`crate::Metric`].
#[derive(Debug)]
pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonWriter<W> {
    fn emit(&mut self, record: Record) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, &record.to_metric())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::classify_row;

    fn sample() -> Record {
        classify_row(&["cpu", "core", "busy_percent"], &["0", "1", "0.53"]).unwrap()
    }

    #[test]
    fn line_protocol_writer_emits_one_line_per_record() {
        let mut sink = LineProtocolWriter::new(Vec::new());
        sink.emit(sample()).unwrap();
        sink.emit(sample()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text,
            "turbostat,cpu=0,core=1 busy_percent=0.53\nturbostat,cpu=0,core=1 busy_percent=0.53\n"
        );
    }

    #[test]
    fn json_writer_emits_structured_metric() {
        let mut sink = JsonWriter::new(Vec::new());
        sink.emit(sample()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["name"], "turbostat");
        assert_eq!(value["tags"]["core"], "1");
        assert_eq!(value["fields"]["busy_percent"], 0.53);
        assert!(value.get("timestamp").is_none());
    }
}
