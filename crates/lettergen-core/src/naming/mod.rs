//! Output naming
//!
//! Names are resolved in two steps. [`plan_names`] runs once before the batch
//! is dispatched and settles in-batch collisions in row order, so the result
//! does not depend on which worker finishes first. Workers then
//! [`claim`](NameRegistry::claim) their planned name against files already in
//! the output directory, following the [`ExistingFilePolicy`].

mod sanitize;

pub use sanitize::{fallback_name, sanitize};

use crate::config::ExistingFilePolicy;
use crate::config::consts::naming::{MAX_DISAMBIGUATION_ATTEMPTS, MAX_STEM_CHARS};
use crate::row::Row;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Reasons a row cannot get an output name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("'{name}' already exists in the output directory")]
    AlreadyExists { name: String },

    #[error("no free name for '{name}' after {attempts} attempts")]
    Exhausted { name: String, attempts: usize },
}

/// Sanitized base name for one row, before collision handling
pub fn base_name(row: &Row, field: &str) -> String {
    row.get(field)
        .and_then(sanitize)
        .unwrap_or_else(|| fallback_name(row.index()))
}

/// Unique base names for `rows`, in row order
///
/// Collisions compare case-insensitively; a later row gets `name (1)`,
/// `name (2)` and so on.
pub fn plan_names(rows: &[Row], field: &str) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(rows.len());
    let mut names = Vec::with_capacity(rows.len());

    for row in rows {
        let base = base_name(row, field);
        let mut candidate = base.clone();
        let mut k = 1;
        while taken.contains(&fold(&candidate)) {
            candidate = numbered(&base, k);
            k += 1;
        }
        taken.insert(fold(&candidate));
        names.push(candidate);
    }

    names
}

/// `name (k)`, shortening `name` so the whole stays within the length limit
fn numbered(base: &str, k: usize) -> String {
    let suffix = format!(" ({})", k);
    let keep = MAX_STEM_CHARS.saturating_sub(suffix.chars().count());
    let stem = sanitize::truncate_chars(base, keep).trim_end_matches([' ', '.']);
    format!("{}{}", stem, suffix)
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// Shared record of names handed out during a batch
///
/// The lock is held only while checking and inserting a name.
#[derive(Debug)]
pub struct NameRegistry {
    output_dir: PathBuf,
    policy: ExistingFilePolicy,
    planned: HashSet<String>,
    claimed: Mutex<HashSet<String>>,
}

impl NameRegistry {
    pub fn new(output_dir: impl AsRef<Path>, policy: ExistingFilePolicy, planned: &[String]) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            policy,
            planned: planned.iter().map(|n| fold(n)).collect(),
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Final name for a row whose planned name is `planned`
    pub fn claim(&self, planned: &str) -> Result<String, NameError> {
        let mut claimed = self
            .claimed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !self.exists_on_disk(planned) || self.policy == ExistingFilePolicy::Overwrite {
            claimed.insert(fold(planned));
            return Ok(planned.to_string());
        }

        if self.policy == ExistingFilePolicy::Fail {
            return Err(NameError::AlreadyExists {
                name: planned.to_string(),
            });
        }

        for k in 1..=MAX_DISAMBIGUATION_ATTEMPTS {
            let candidate = numbered(planned, k);
            let key = fold(&candidate);
            if self.planned.contains(&key) || claimed.contains(&key) {
                continue;
            }
            if self.exists_on_disk(&candidate) {
                continue;
            }
            tracing::debug!(planned, name = %candidate, "disambiguated against existing files");
            claimed.insert(key);
            return Ok(candidate);
        }

        Err(NameError::Exhausted {
            name: planned.to_string(),
            attempts: MAX_DISAMBIGUATION_ATTEMPTS,
        })
    }

    fn exists_on_disk(&self, name: &str) -> bool {
        let (pdf, docx) = output_paths(&self.output_dir, name);
        pdf.exists() || docx.exists()
    }
}

/// `(pdf_path, docx_path)` for a base name
pub fn output_paths(output_dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        output_dir.join(format!("{}.pdf", name)),
        output_dir.join(format!("{}.docx", name)),
    )
}
