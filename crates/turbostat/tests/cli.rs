#![cfg(unix)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process::Command,
};

fn write_fake_turbostat(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("turbostat");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn influxdb() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_turbostat-influxdb"));
    command.env_remove("TURBOSTAT_BINARY").env_remove("RUST_LOG");
    command
}

const SAMPLE: &str = r"printf 'Core\tCPU\tBusy%%\tCorWatt\n'
printf '%s\t%s\t%s\t%s\n' - - 0.99 1.05
printf '0\t0\t0.89\t0.06\n'
printf '0\t8\t0.26\n'
printf 'Core\tCPU\tBusy%%\tCorWatt\n'
printf '0\t0\t1.30\t0.09\n'";

#[test]
fn prints_line_protocol_by_default() {
    let temp = tempfile::tempdir().unwrap();
    let fake = write_fake_turbostat(temp.path(), SAMPLE);

    let output = influxdb().arg("--binary").arg(&fake).output().unwrap();
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        [
            "turbostat,core=-,cpu=- busy_percent=0.99,corwatt=1.05",
            "turbostat,core=0,cpu=0 busy_percent=0.89,corwatt=0.06",
            "turbostat,core=0,cpu=8 busy_percent=0.26",
            "turbostat,core=0,cpu=0 busy_percent=1.30,corwatt=0.09",
        ]
    );
}

#[test]
fn json_format_and_forwarded_args() {
    let temp = tempfile::tempdir().unwrap();
    let fake = write_fake_turbostat(
        temp.path(),
        r#"printf 'CPU\tBusy%%\n'; printf '%s\t%s\n' "$1" "$2""#,
    );

    let output = influxdb()
        .arg("--binary")
        .arg(&fake)
        .args(["--format", "json", "--", "7", "0.42"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let metric: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(metric["name"], "turbostat");
    assert_eq!(metric["tags"]["cpu"], "7");
    assert_eq!(metric["fields"]["busy_percent"], 0.42);
    assert!(metric.get("timestamp").is_none());
}

#[test]
fn help_flags_are_forwarded_to_turbostat() {
    let temp = tempfile::tempdir().unwrap();
    let fake = write_fake_turbostat(
        temp.path(),
        r#"printf 'CPU	Seen
'
case "$1" in -h|--help) printf '%s	%s
' - 1 ;; esac"#,
    );

    for flag in ["--help", "-h"] {
        let output = influxdb().arg("--binary").arg(&fake).arg(flag).output().unwrap();
        assert!(output.status.success(), "{output:?}");
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert_eq!(stdout.trim_end(), "turbostat,cpu=- seen=1", "{flag}");
    }
}

#[test]
fn row_error_exits_with_failure() {
    let temp = tempfile::tempdir().unwrap();
    let fake = write_fake_turbostat(temp.path(), r"printf 'CPU\tBusy%%\n'; printf 'x\t1\n'");

    let output = influxdb().arg("--binary").arg(&fake).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("turbostat-influxdb:"), "{stderr}");
    assert!(stderr.contains("invalid tag"), "{stderr}");
}

#[test]
fn missing_binary_exits_with_failure() {
    let temp = tempfile::tempdir().unwrap();

    let output = influxdb()
        .arg("--binary")
        .arg(temp.path().join("missing"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn plugin_without_command_is_a_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_turbostat-telegraf-plugin"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}
