//! Driver tests against real files.

use script_cli::{CliError, Driver, Rendering};
use std::io::Write;

#[test]
fn test_compile_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "let frames = 0; frames = frames + 1;").unwrap();
    let path = file.path().to_string_lossy().to_string();
    let mut driver = Driver::new();
    let output = driver.run_file(&path, Rendering::Disassembly).unwrap();
    assert!(output.contains("[.section text]"));
    assert!(output.contains("\"frames\""));
}

#[test]
fn test_missing_file_is_io_error() {
    let mut driver = Driver::new();
    let error = driver
        .run_file("definitely/not/here.vs", Rendering::Check)
        .unwrap_err();
    assert!(matches!(error, CliError::Io(_)));
}

#[test]
fn test_syntax_error_reports_position() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "let = ;").unwrap();
    let path = file.path().to_string_lossy().to_string();
    let mut driver = Driver::new();
    let error = driver.run_file(&path, Rendering::Check).unwrap_err();
    let CliError::Compile(error) = error else {
        panic!("expected a compile error");
    };
    assert!(error.span.is_some());
}
