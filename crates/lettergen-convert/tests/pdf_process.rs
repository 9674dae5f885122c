//! wkhtmltopdf driver against stand-in converter scripts

#![cfg(unix)]

use lettergen_convert::WkhtmltopdfConverter;
use lettergen_core::ConversionKind;
use lettergen_testkit::{temp_dir_in_workspace, write_script};
use std::time::Duration;

fn converter(binary: std::path::PathBuf, timeout: Duration) -> WkhtmltopdfConverter {
    WkhtmltopdfConverter::new(binary, [15, 15, 15, 15], timeout)
}

#[test]
fn test_stdout_becomes_pdf_bytes() {
    let temp = temp_dir_in_workspace();
    let script = write_script(temp.path(), "fake-wkhtmltopdf", "printf '%%PDF-'; cat");

    let pdf = converter(script, Duration::from_secs(10))
        .convert("<p>Dear Alice</p>")
        .unwrap();

    assert_eq!(pdf, b"%PDF-<p>Dear Alice</p>");
}

#[test]
fn test_arguments_passed_to_binary() {
    let temp = temp_dir_in_workspace();
    let args_file = temp.path().join("args.txt");
    let script = write_script(
        temp.path(),
        "fake-wkhtmltopdf",
        &format!("echo \"$@\" > '{}'; cat", args_file.display()),
    );

    converter(script, Duration::from_secs(10))
        .convert("<p>x</p>")
        .unwrap();

    let args = std::fs::read_to_string(&args_file).unwrap();
    assert!(args.contains("--enable-local-file-access"));
    assert!(args.contains("--margin-top 15mm"));
    assert!(args.trim_end().ends_with("- -"));
}

#[test]
fn test_nonzero_exit_reports_stderr() {
    let temp = temp_dir_in_workspace();
    let script = write_script(
        temp.path(),
        "fake-wkhtmltopdf",
        "cat > /dev/null; echo 'Exit with code 1 due to network error: HostNotFoundError' >&2; exit 3",
    );

    let err = converter(script, Duration::from_secs(10))
        .convert("<p>x</p>")
        .unwrap_err();

    assert_eq!(err.kind, ConversionKind::Pdf);
    assert!(err.detail.contains("HostNotFoundError"), "{}", err.detail);
    assert!(err.detail.contains("exited with"), "{}", err.detail);
}

#[test]
fn test_stderr_excerpt_is_bounded() {
    let temp = temp_dir_in_workspace();
    let script = write_script(
        temp.path(),
        "fake-wkhtmltopdf",
        "cat > /dev/null; i=0; while [ $i -lt 200 ]; do printf 'warning line\\n' >&2; i=$((i+1)); done; exit 1",
    );

    let err = converter(script, Duration::from_secs(10))
        .convert("<p>x</p>")
        .unwrap_err();

    assert!(err.detail.len() < 700, "{}", err.detail.len());
}

#[test]
fn test_empty_output_is_error() {
    let temp = temp_dir_in_workspace();
    let script = write_script(temp.path(), "fake-wkhtmltopdf", "cat > /dev/null");

    let err = converter(script, Duration::from_secs(10))
        .convert("<p>x</p>")
        .unwrap_err();

    assert!(err.detail.contains("no output"), "{}", err.detail);
}

#[test]
fn test_hung_converter_times_out() {
    let temp = temp_dir_in_workspace();
    let script = write_script(temp.path(), "fake-wkhtmltopdf", "exec sleep 30");

    let started = std::time::Instant::now();
    let err = converter(script, Duration::from_millis(300))
        .convert("<p>x</p>")
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(err.detail.contains("timed out"), "{}", err.detail);
}

#[test]
fn test_missing_binary_is_conversion_error() {
    let err = converter("/definitely/not/wkhtmltopdf".into(), Duration::from_secs(1))
        .convert("<p>x</p>")
        .unwrap_err();
    assert_eq!(err.kind, ConversionKind::Pdf);
}
