use std::collections::BTreeMap;
use std::path::PathBuf;

use turbostat_events::{
    process_stream, LineProtocolWriter, Metric, Record, StreamEnd, MEASUREMENT,
};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn metric(core: &str, cpu: &str, fields: &[(&str, f64)]) -> Metric {
    let tags = BTreeMap::from([
        ("core".to_string(), core.to_string()),
        ("cpu".to_string(), cpu.to_string()),
    ]);
    let fields = fields
        .iter()
        .map(|(key, value)| (key.to_string(), *value))
        .collect();
    Metric::new(MEASUREMENT, tags, fields)
}

#[test]
fn fixture_yields_one_metric_per_data_row() {
    let file = std::fs::File::open(fixture_path("turbostat.tsv")).expect("open fixture");
    let mut records: Vec<Record> = Vec::new();
    let summary = process_stream(file, &mut records).expect("process fixture");

    assert_eq!(summary.end, StreamEnd::Exhausted);
    assert_eq!(summary.repeated_headers, 1);

    let metrics: Vec<Metric> = records.iter().map(Record::to_metric).collect();
    let expected = vec![
        metric("-", "-", &[("busy_percent", 0.99), ("corwatt", 1.05)]),
        metric("0", "0", &[("busy_percent", 0.89), ("corwatt", 0.06)]),
        metric("0", "8", &[("busy_percent", 0.26)]),
        metric("-", "-", &[("busy_percent", 1.34), ("corwatt", 1.13)]),
        metric("0", "0", &[("busy_percent", 1.30), ("corwatt", 0.09)]),
        metric("0", "8", &[("busy_percent", 0.42)]),
    ];
    assert_eq!(metrics, expected);
}

#[test]
fn fixture_renders_as_line_protocol() {
    let file = std::fs::File::open(fixture_path("turbostat.tsv")).expect("open fixture");
    let mut sink = LineProtocolWriter::new(Vec::new());
    process_stream(file, &mut sink).expect("process fixture");

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "turbostat,core=-,cpu=- busy_percent=0.99,corwatt=1.05");
    assert_eq!(lines[2], "turbostat,core=0,cpu=8 busy_percent=0.26");
    assert_eq!(lines[4], "turbostat,core=0,cpu=0 busy_percent=1.30,corwatt=0.09");
}
