//! Conversion backend seam
//!
//! The scheduler renders a row once and hands the identical HTML string to
//! both conversions. Concrete backends live in the `lettergen-convert` crate;
//! tests plug in fakes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which output format a conversion produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionKind {
    Pdf,
    Docx,
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionKind::Pdf => write!(f, "pdf"),
            ConversionKind::Docx => write!(f, "docx"),
        }
    }
}

/// A failed HTML conversion
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} conversion failed: {detail}")]
pub struct ConversionError {
    pub kind: ConversionKind,
    pub detail: String,
}

impl ConversionError {
    pub fn pdf(detail: impl Into<String>) -> Self {
        Self {
            kind: ConversionKind::Pdf,
            detail: detail.into(),
        }
    }

    pub fn docx(detail: impl Into<String>) -> Self {
        Self {
            kind: ConversionKind::Docx,
            detail: detail.into(),
        }
    }
}

/// HTML → PDF and HTML → DOCX
///
/// Called concurrently from every worker. A backend wrapping a single
/// long-lived process must serialize or pool access to it internally.
pub trait ConversionBackend: Send + Sync {
    fn to_pdf(&self, html: &str) -> Result<Vec<u8>, ConversionError>;

    fn to_docx(&self, html: &str) -> Result<Vec<u8>, ConversionError>;
}

impl<T: ConversionBackend + ?Sized> ConversionBackend for &T {
    fn to_pdf(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        (**self).to_pdf(html)
    }

    fn to_docx(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        (**self).to_docx(html)
    }
}

impl<T: ConversionBackend + ?Sized> ConversionBackend for Box<T> {
    fn to_pdf(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        (**self).to_pdf(html)
    }

    fn to_docx(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        (**self).to_docx(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_display() {
        assert_eq!(
            ConversionError::pdf("exit status 1").to_string(),
            "pdf conversion failed: exit status 1"
        );
        assert_eq!(ConversionError::docx("bad").kind, ConversionKind::Docx);
    }
}
