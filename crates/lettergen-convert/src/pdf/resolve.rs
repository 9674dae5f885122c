//! Locating the wkhtmltopdf binary
//!
//! Resolution priority:
//! 1. Explicit path from configuration (`pdf.binary`)
//! 2. `LETTERGEN_WKHTMLTOPDF` environment variable
//! 3. A copy bundled next to the running executable
//! 4. System PATH

use lettergen_core::config::consts::pdf::BINARY_ENV;
use lettergen_core::{LetterGenError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[cfg(windows)]
const BINARY_NAME: &str = "wkhtmltopdf.exe";
#[cfg(not(windows))]
const BINARY_NAME: &str = "wkhtmltopdf";

/// Bundled locations, relative to the executable's directory
const BUNDLED_DIRS: &[&str] = &["bin", "wkhtmltopdf", "third_party/wkhtmltopdf"];

/// Find wkhtmltopdf following the resolution priority
pub fn resolve_binary(explicit: Option<&Path>) -> Result<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    resolve_with(
        explicit,
        std::env::var_os(BINARY_ENV),
        exe_dir.as_deref(),
        || which::which(BINARY_NAME).ok(),
    )
}

/// Resolution with every input supplied by the caller
pub(crate) fn resolve_with<F>(
    explicit: Option<&Path>,
    env_value: Option<OsString>,
    exe_dir: Option<&Path>,
    search_path: F,
) -> Result<PathBuf>
where
    F: FnOnce() -> Option<PathBuf>,
{
    // An explicitly named binary must exist, with no fallback
    if let Some(path) = explicit {
        return existing(path, "pdf.binary");
    }
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return existing(Path::new(&value), BINARY_ENV);
    }

    let mut searched = Vec::new();

    if let Some(dir) = exe_dir {
        for bundled in BUNDLED_DIRS {
            let candidate = dir.join(bundled).join(BINARY_NAME);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "using bundled wkhtmltopdf");
                return Ok(candidate);
            }
            searched.push(candidate.display().to_string());
        }
    }

    if let Some(found) = search_path() {
        tracing::debug!(path = %found.display(), "using wkhtmltopdf from PATH");
        return Ok(found);
    }
    searched.push("PATH".to_string());

    Err(LetterGenError::ConverterNotFound {
        searched: searched.join(", "),
    })
}

fn existing(path: &Path, source: &str) -> Result<PathBuf> {
    if path.is_file() {
        tracing::debug!(path = %path.display(), source, "using configured wkhtmltopdf");
        Ok(path.to_path_buf())
    } else {
        Err(LetterGenError::ConverterNotFound {
            searched: format!("{} ({})", path.display(), source),
        })
    }
}
