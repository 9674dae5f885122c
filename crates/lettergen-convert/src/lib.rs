//! Concrete conversion backends for LetterGen
//!
//! - [`pdf`]: drives an external `wkhtmltopdf` process (HTML on stdin, PDF on
//!   stdout)
//! - [`docx`]: writes WordprocessingML natively from the parsed HTML
//!
//! [`NativeBackend`] pairs the two behind the scheduler's
//! [`ConversionBackend`] seam.

pub mod docx;
pub mod pdf;

pub use docx::HtmlDocxConverter;
pub use pdf::WkhtmltopdfConverter;

use lettergen_core::{ConversionBackend, ConversionError, PdfSettings, Result};

/// wkhtmltopdf for PDF, the built-in writer for DOCX
#[derive(Debug, Clone)]
pub struct NativeBackend {
    pdf: WkhtmltopdfConverter,
    docx: HtmlDocxConverter,
}

impl NativeBackend {
    pub fn new(pdf: WkhtmltopdfConverter, docx: HtmlDocxConverter) -> Self {
        Self { pdf, docx }
    }

    /// Resolve the PDF converter binary and share the page margins
    ///
    /// Fails with `CONVERTER_NOT_FOUND` when no wkhtmltopdf can be located.
    pub fn from_settings(settings: &PdfSettings) -> Result<Self> {
        let pdf = WkhtmltopdfConverter::from_settings(settings)?;
        let docx = HtmlDocxConverter::new().with_margins_mm(settings.margins_mm);
        Ok(Self::new(pdf, docx))
    }

    pub fn pdf(&self) -> &WkhtmltopdfConverter {
        &self.pdf
    }
}

impl ConversionBackend for NativeBackend {
    fn to_pdf(&self, html: &str) -> std::result::Result<Vec<u8>, ConversionError> {
        self.pdf.convert(html)
    }

    fn to_docx(&self, html: &str) -> std::result::Result<Vec<u8>, ConversionError> {
        self.docx.convert(html)
    }
}
