use std::path::PathBuf;
use thiserror::Error;

/// Configuration-level errors.
///
/// Any of these aborts a batch before a single row is dispatched. Per-row
/// failures never surface here; they are recorded in the
/// [`BatchReport`](crate::job::BatchReport) instead.
#[derive(Error, Debug)]
pub enum LetterGenError {
    // Template errors
    #[error("TEMPLATE_READ_FAILED: cannot read template '{}': {source}", .path.display())]
    TemplateReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TEMPLATE_INVALID: template '{}' is invalid: {reason}", .path.display())]
    TemplateInvalid { path: PathBuf, reason: String },

    // Data errors
    #[error("DATA_READ_FAILED: cannot read data file '{}': {reason}", .path.display())]
    DataReadFailed { path: PathBuf, reason: String },

    #[error(
        "DATA_UNSUPPORTED_FORMAT: unsupported data file '{}', use CSV or XLSX",
        .path.display()
    )]
    DataUnsupportedFormat { path: PathBuf },

    #[error("ROW_OUT_OF_RANGE: row {index} requested but the data has {total} row(s)")]
    RowOutOfRange { index: usize, total: usize },

    // Output errors
    #[error("OUTPUT_DIR_UNAVAILABLE: cannot create output directory '{}': {source}", .path.display())]
    OutputDirUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    // Config errors
    #[error("CONFIG_PARSE_ERROR: {0}")]
    ConfigParseError(String),

    #[error("CONFIG_INVALID_VALUE: {field}: {reason}")]
    ConfigInvalidValue { field: String, reason: String },

    // Converter errors
    #[error("CONVERTER_NOT_FOUND: wkhtmltopdf not found (searched: {searched})")]
    ConverterNotFound { searched: String },

    // Scheduler errors
    #[error("WORKER_POOL_FAILED: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, LetterGenError>;
