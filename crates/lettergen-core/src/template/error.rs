//! Template error types

use std::fmt;
use std::path::PathBuf;

/// Template compilation and rendering errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Malformed template syntax
    MalformedSyntax {
        /// Error message
        message: String,
        /// Line number where the error occurred
        line: usize,
    },

    /// A `required` field is absent from the row or blank
    MissingRequiredField {
        /// The field that had no value
        field: String,
        /// Line number of the placeholder
        line: usize,
    },

    /// The asset base directory cannot be expressed as a `file://` URL
    InvalidBaseDir { path: PathBuf },

    /// The rendered HTML could not be rewritten
    AssetRewrite { message: String },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::MalformedSyntax { message, line } => {
                write!(f, "Malformed syntax at line {}: {}", line, message)
            }
            TemplateError::MissingRequiredField { field, line } => {
                write!(
                    f,
                    "Required field '{}' is missing or empty (placeholder at line {})",
                    field, line
                )
            }
            TemplateError::InvalidBaseDir { path } => {
                write!(
                    f,
                    "Asset base directory '{}' must be an absolute path",
                    path.display()
                )
            }
            TemplateError::AssetRewrite { message } => {
                write!(f, "Failed to resolve template assets: {}", message)
            }
        }
    }
}

impl std::error::Error for TemplateError {}
