//! Exit codes and diagnostics of the `county-health import` command.

use std::path::Path;
use std::process::{Command, Output};

fn import(store: &Path, csv: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_county-health"))
        .arg("import")
        .arg(store)
        .arg(csv)
        .env("RUST_LOG", "error")
        .output()
        .unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn import_succeeds_with_exit_zero() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("data.db");
    let csv = dir.path().join("zip_county.csv");
    std::fs::write(&csv, "zip,county_code\n02138,25017\n").unwrap();

    let output = import(&store, &csv);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(store.exists());
}

#[test]
fn missing_csv_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("data.db");

    let output = import(&store, &dir.path().join("nope.csv"));

    assert!(!output.status.success());
    assert!(stderr(&output).contains("CSV not found"));
    assert!(!store.exists());
}

#[test]
fn empty_csv_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("data.db");
    let csv = dir.path().join("empty.csv");
    std::fs::write(&csv, "").unwrap();

    let output = import(&store, &csv);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("CSV appears to be empty (no header row)."));
    assert!(!store.exists());
}

#[test]
fn missing_arguments_are_a_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_county-health"))
        .arg("import")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Usage"));
}
