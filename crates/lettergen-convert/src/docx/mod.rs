//! Native HTML → DOCX conversion
//!
//! The rendered HTML is parsed with html5ever into a small document model
//! ([`model`]) and written out as a WordprocessingML package ([`package`]).
//! Supported: headings, paragraphs, line breaks, bold/italic/underline,
//! alignment, lists, block quotes, tables, rules and local images.
//! Anything else degrades to its text content.

mod helpers;
mod html;
pub mod model;
mod package;

use lettergen_core::ConversionError;
use package::PageMargins;

const DEFAULT_MARGIN_MM: u32 = 15;

/// Twips per CSS pixel at 96 dpi
const TWIPS_PER_PX: f64 = 15.0;

#[derive(Debug, Clone)]
pub struct HtmlDocxConverter {
    margins: PageMargins,
}

impl Default for HtmlDocxConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlDocxConverter {
    pub fn new() -> Self {
        Self {
            margins: PageMargins([DEFAULT_MARGIN_MM; 4]),
        }
    }

    /// Page margins `[top, right, bottom, left]` in millimetres
    pub fn with_margins_mm(mut self, margins_mm: [u32; 4]) -> Self {
        self.margins = PageMargins(margins_mm);
        self
    }

    pub fn convert(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        let max_width_px = self.margins.text_width_twips() as f64 / TWIPS_PER_PX;
        let document = html::build_document(html, max_width_px)?;

        tracing::trace!(
            blocks = document.blocks.len(),
            images = document.media.len(),
            "writing docx package"
        );

        package::write_package(&document, self.margins)
            .map_err(|e| ConversionError::docx(format!("cannot write package: {}", e)))
    }
}
