//! HTML → PDF through wkhtmltopdf
//!
//! Each conversion is a one-shot process: HTML is written to stdin and the
//! PDF read from stdout, so concurrent calls need no coordination.

mod exec;
mod resolve;

pub use exec::{ExecError, ExecOutput, run_with_input};
pub use resolve::resolve_binary;

use lettergen_core::{ConversionError, PdfSettings, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Characters of converter stderr kept in error details
const STDERR_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct WkhtmltopdfConverter {
    binary: PathBuf,
    margins_mm: [u32; 4],
    timeout: Duration,
}

impl WkhtmltopdfConverter {
    pub fn new(binary: impl Into<PathBuf>, margins_mm: [u32; 4], timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            margins_mm,
            timeout,
        }
    }

    /// Resolve the binary and take margins and timeout from `settings`
    pub fn from_settings(settings: &PdfSettings) -> Result<Self> {
        let binary = resolve_binary(settings.binary.as_deref())?;
        Ok(Self::new(
            binary,
            settings.margins_mm,
            Duration::from_secs(settings.timeout_secs),
        ))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Command line: read HTML from stdin, write PDF to stdout
    pub fn args(&self) -> Vec<String> {
        let [top, right, bottom, left] = self.margins_mm;
        let mut args: Vec<String> = [
            "--quiet",
            "--enable-local-file-access",
            "--encoding",
            "utf-8",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        for (flag, mm) in [
            ("--margin-top", top),
            ("--margin-right", right),
            ("--margin-bottom", bottom),
            ("--margin-left", left),
        ] {
            args.push(flag.to_string());
            args.push(format!("{}mm", mm));
        }

        args.push("-".to_string());
        args.push("-".to_string());
        args
    }

    pub fn convert(&self, html: &str) -> std::result::Result<Vec<u8>, ConversionError> {
        let output = run_with_input(&self.binary, &self.args(), html.as_bytes(), self.timeout)
            .map_err(|e| ConversionError::pdf(format!("wkhtmltopdf: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(STDERR_LIMIT).collect();
            return Err(ConversionError::pdf(format!(
                "wkhtmltopdf exited with {}: {}",
                output.status, excerpt
            )));
        }

        if output.stdout.is_empty() {
            return Err(ConversionError::pdf("wkhtmltopdf produced no output"));
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_layout() {
        let converter =
            WkhtmltopdfConverter::new("wkhtmltopdf", [10, 12, 14, 16], Duration::from_secs(5));
        assert_eq!(
            converter.args(),
            vec![
                "--quiet",
                "--enable-local-file-access",
                "--encoding",
                "utf-8",
                "--margin-top",
                "10mm",
                "--margin-right",
                "12mm",
                "--margin-bottom",
                "14mm",
                "--margin-left",
                "16mm",
                "-",
                "-",
            ]
        );
    }
}
