//! Core of LetterGen: renders one HTML template against rows of tabular
//! data and fans the rows out to PDF/DOCX conversion in bounded parallel
//! batches.
//!
//! The crate is organized leaves first:
//!
//! - [`row`]: rows and the CSV/XLSX row sources
//! - [`template`]: template compilation, substitution and asset resolution
//! - [`naming`]: output filename sanitization and collision handling
//! - [`convert`]: the conversion backend seam (HTML → PDF / DOCX bytes)
//! - [`job`]: the batch scheduler and its report

// Core modules
pub mod config;
pub mod convert;
pub mod error;
pub mod job;
pub mod naming;
pub mod row;
pub mod template;

// Re-export commonly used types
pub use config::{BatchConfig, ConfigLayer, ExistingFilePolicy, PdfSettings};
pub use convert::{ConversionBackend, ConversionError, ConversionKind};
pub use error::{LetterGenError, Result};
pub use job::{
    BatchOptions, BatchReport, CancellationToken, JobResult, JobScheduler, Progress,
    ProgressObserver, Stage,
};
pub use row::{Dataset, Row, RowSource};
pub use template::{Template, TemplateError};
