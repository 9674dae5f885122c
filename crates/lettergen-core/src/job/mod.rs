//! Batch scheduling
//!
//! [`JobScheduler`] fans rows out over a fixed pool of worker threads. Each
//! row runs render → name → PDF → DOCX → write on one worker; a failure at
//! any stage ends that row only. The [`BatchReport`] always holds one result
//! per input row, in input order.

mod cancel;
mod commit;
mod error;
mod progress;
mod report;
mod scheduler;

pub use cancel::CancellationToken;
pub use commit::{WriteError, commit_pair};
pub use error::JobError;
pub use progress::{Progress, ProgressObserver};
pub use report::{BatchReport, JobResult, Stage};
pub use scheduler::{JobScheduler, effective_workers};

use crate::config::{BatchConfig, ExistingFilePolicy, consts};
use std::path::PathBuf;

/// Settings the scheduler needs from a [`BatchConfig`]
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub filename_field: String,
    pub worker_count: usize,
    pub existing_files: ExistingFilePolicy,
}

impl BatchOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            filename_field: consts::naming::DEFAULT_FILENAME_FIELD.to_string(),
            worker_count: crate::config::default_worker_count(),
            existing_files: ExistingFilePolicy::default(),
        }
    }

    pub fn filename_field(mut self, field: impl Into<String>) -> Self {
        self.filename_field = field.into();
        self
    }

    pub fn workers(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn existing_files(mut self, policy: ExistingFilePolicy) -> Self {
        self.existing_files = policy;
        self
    }
}

impl From<&BatchConfig> for BatchOptions {
    fn from(config: &BatchConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            filename_field: config.filename_field.clone(),
            worker_count: config.worker_count,
            existing_files: config.existing_files,
        }
    }
}
