//! Atomic placement of an output pair

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use thiserror::Error;

/// Writing or placing an output file failed
#[derive(Error, Debug)]
#[error("cannot write '{}': {source}", .path.display())]
pub struct WriteError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

/// Write both files of a pair, or neither
///
/// Both payloads go to hidden temporary files in `dir` first. A DOCX left by
/// an earlier run is moved aside, the new DOCX is renamed into place, then the
/// PDF. If the PDF rename fails the earlier DOCX is put back (or the new one
/// removed), so the final names never mix files from two runs.
pub fn commit_pair(
    dir: &Path,
    pdf_path: &Path,
    pdf: &[u8],
    docx_path: &Path,
    docx: &[u8],
) -> Result<(), WriteError> {
    let pdf_temp = stage(dir, pdf_path, pdf)?;
    let docx_temp = stage(dir, docx_path, docx)?;
    let previous = set_aside(dir, docx_path)?;

    if let Err(e) = docx_temp.persist(docx_path) {
        if let Some(previous) = previous {
            restore(previous, docx_path);
        }
        return Err(WriteError {
            path: docx_path.to_path_buf(),
            source: e.error,
        });
    }

    if let Err(e) = pdf_temp.persist(pdf_path) {
        match previous {
            Some(previous) => restore(previous, docx_path),
            None => {
                if let Err(cleanup) = std::fs::remove_file(docx_path) {
                    tracing::warn!(
                        path = %docx_path.display(),
                        error = %cleanup,
                        "failed to remove half-written pair"
                    );
                }
            }
        }
        return Err(WriteError {
            path: pdf_path.to_path_buf(),
            source: e.error,
        });
    }

    // Dropping `previous` deletes the superseded DOCX
    Ok(())
}

/// Move an existing file to a hidden temporary path in `dir`
fn set_aside(dir: &Path, path: &Path) -> Result<Option<TempPath>, WriteError> {
    if !path.is_file() {
        return Ok(None);
    }
    let to_error = |source| WriteError {
        path: path.to_path_buf(),
        source,
    };

    let backup = tempfile::Builder::new()
        .prefix(".lettergen-")
        .suffix(".old")
        .tempfile_in(dir)
        .map_err(to_error)?
        .into_temp_path();
    std::fs::rename(path, &backup).map_err(to_error)?;
    Ok(Some(backup))
}

fn restore(previous: TempPath, path: &Path) {
    if let Err(e) = previous.persist(path) {
        tracing::warn!(
            path = %path.display(),
            error = %e.error,
            "failed to restore previous file"
        );
    }
}

/// Temporary file holding `contents`, removed on drop unless persisted
fn stage(dir: &Path, target: &Path, contents: &[u8]) -> Result<NamedTempFile, WriteError> {
    let to_error = |source| WriteError {
        path: target.to_path_buf(),
        source,
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".lettergen-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(to_error)?;
    temp.write_all(contents).map_err(to_error)?;
    temp.flush().map_err(to_error)?;
    temp.as_file().sync_all().map_err(to_error)?;
    Ok(temp)
}
