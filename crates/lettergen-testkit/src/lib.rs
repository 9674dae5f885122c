//! Test utilities for lettergen
//!
//! This crate provides shared testing utilities used across the lettergen workspace.

pub mod env;
pub mod fixtures;
pub mod mock;

pub use env::{ENV_LOCK, with_env_var};
pub use fixtures::{SheetCell, rows, write_csv, write_script, write_template, write_xlsx};
pub use mock::{FailingBackend, GatedBackend, PanickingBackend, RecordingBackend};

use tempfile::TempDir;

/// Creates a temporary directory within `.tmp/` at the project root
///
/// All test files stay in one gitignored location that is easy to clean up
/// by hand. The directory is removed when the returned `TempDir` drops.
///
/// # Panics
///
/// Panics if the current directory is unknown or `.tmp/` cannot be created.
///
/// # Examples
///
/// ```rust
/// use lettergen_testkit::temp_dir_in_workspace;
///
/// let temp = temp_dir_in_workspace();
/// let file_path = temp.path().join("letter.html");
/// std::fs::write(&file_path, "<p>{{name}}</p>").unwrap();
/// ```
pub fn temp_dir_in_workspace() -> TempDir {
    try_temp_dir_in_workspace().expect("Failed to create temporary directory in .tmp/")
}

/// Alternative with Result for non-test code
pub fn try_temp_dir_in_workspace() -> std::io::Result<TempDir> {
    let workspace_root = std::env::current_dir()?;
    let tmp_base = workspace_root.join(".tmp");
    std::fs::create_dir_all(&tmp_base)?;
    TempDir::new_in(&tmp_base)
}
