//! Fake conversion backends
//!
//! Outputs are derived from the HTML bytes only, so identical input gives
//! identical files.

use lettergen_core::{ConversionBackend, ConversionError, ConversionKind};
use std::sync::{Condvar, Mutex};

fn fake_bytes(kind: ConversionKind, html: &str) -> Vec<u8> {
    let mut bytes = match kind {
        ConversionKind::Pdf => b"%PDF-fake\n".to_vec(),
        ConversionKind::Docx => b"PK-fake\n".to_vec(),
    };
    bytes.extend_from_slice(html.as_bytes());
    bytes
}

/// Records every call and returns deterministic bytes
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<(ConversionKind, String)>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(kind, html)` seen so far, in call order
    pub fn calls(&self) -> Vec<(ConversionKind, String)> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// HTML passed to one kind of conversion, sorted
    pub fn html_for(&self, kind: ConversionKind) -> Vec<String> {
        let mut html: Vec<String> = self
            .calls()
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, h)| h)
            .collect();
        html.sort();
        html
    }

    fn record(&self, kind: ConversionKind, html: &str) -> Vec<u8> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((kind, html.to_string()));
        fake_bytes(kind, html)
    }
}

impl ConversionBackend for RecordingBackend {
    fn to_pdf(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        Ok(self.record(ConversionKind::Pdf, html))
    }

    fn to_docx(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        Ok(self.record(ConversionKind::Docx, html))
    }
}

/// Fails a conversion whenever the HTML contains a marker string
#[derive(Debug, Default)]
pub struct FailingBackend {
    pdf_marker: Option<String>,
    docx_marker: Option<String>,
}

impl FailingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_pdf_on(mut self, marker: impl Into<String>) -> Self {
        self.pdf_marker = Some(marker.into());
        self
    }

    pub fn fail_docx_on(mut self, marker: impl Into<String>) -> Self {
        self.docx_marker = Some(marker.into());
        self
    }
}

impl ConversionBackend for FailingBackend {
    fn to_pdf(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        match &self.pdf_marker {
            Some(marker) if html.contains(marker.as_str()) => {
                Err(ConversionError::pdf(format!("refusing '{}'", marker)))
            }
            _ => Ok(fake_bytes(ConversionKind::Pdf, html)),
        }
    }

    fn to_docx(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        match &self.docx_marker {
            Some(marker) if html.contains(marker.as_str()) => {
                Err(ConversionError::docx(format!("refusing '{}'", marker)))
            }
            _ => Ok(fake_bytes(ConversionKind::Docx, html)),
        }
    }
}

/// Panics inside a conversion whenever the HTML contains a marker string
#[derive(Debug)]
pub struct PanickingBackend {
    kind: ConversionKind,
    marker: String,
}

impl PanickingBackend {
    pub fn new(kind: ConversionKind, marker: impl Into<String>) -> Self {
        Self {
            kind,
            marker: marker.into(),
        }
    }

    fn convert(&self, kind: ConversionKind, html: &str) -> Result<Vec<u8>, ConversionError> {
        if kind == self.kind && html.contains(self.marker.as_str()) {
            panic!("converter crashed on '{}'", self.marker);
        }
        Ok(fake_bytes(kind, html))
    }
}

impl ConversionBackend for PanickingBackend {
    fn to_pdf(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        self.convert(ConversionKind::Pdf, html)
    }

    fn to_docx(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        self.convert(ConversionKind::Docx, html)
    }
}

#[derive(Debug, Default)]
struct Gate {
    open: bool,
    entered: usize,
}

/// Holds every PDF conversion until the gate is opened
///
/// Lets a test observe how many rows are in flight and cancel while they
/// are blocked.
#[derive(Debug, Default)]
pub struct GatedBackend {
    gate: Mutex<Gate>,
    changed: Condvar,
}

impl GatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until at least `count` conversions are waiting at the gate
    pub fn wait_for_entered(&self, count: usize) {
        let mut gate = self.gate.lock().unwrap_or_else(|p| p.into_inner());
        while gate.entered < count {
            gate = self.changed.wait(gate).unwrap_or_else(|p| p.into_inner());
        }
    }

    pub fn open(&self) {
        let mut gate = self.gate.lock().unwrap_or_else(|p| p.into_inner());
        gate.open = true;
        self.changed.notify_all();
    }

    pub fn entered(&self) -> usize {
        self.gate.lock().unwrap_or_else(|p| p.into_inner()).entered
    }
}

impl ConversionBackend for GatedBackend {
    fn to_pdf(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        let mut gate = self.gate.lock().unwrap_or_else(|p| p.into_inner());
        gate.entered += 1;
        self.changed.notify_all();
        while !gate.open {
            gate = self.changed.wait(gate).unwrap_or_else(|p| p.into_inner());
        }
        Ok(fake_bytes(ConversionKind::Pdf, html))
    }

    fn to_docx(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        Ok(fake_bytes(ConversionKind::Docx, html))
    }
}
