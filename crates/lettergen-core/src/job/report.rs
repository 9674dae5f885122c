use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Pipeline stage a row failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Render,
    NameResolution,
    PdfConversion,
    DocxConversion,
    Write,
    Cancelled,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Render => "render",
            Stage::NameResolution => "name-resolution",
            Stage::PdfConversion => "pdf-conversion",
            Stage::DocxConversion => "docx-conversion",
            Stage::Write => "write",
            Stage::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Outcome of one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobResult {
    Success {
        row_index: usize,
        name: String,
        pdf_path: PathBuf,
        docx_path: PathBuf,
        #[serde(rename = "duration_ms", serialize_with = "as_millis")]
        duration: Duration,
    },
    Failure {
        row_index: usize,
        stage: Stage,
        error_detail: String,
    },
}

impl JobResult {
    pub fn row_index(&self) -> usize {
        match self {
            JobResult::Success { row_index, .. } | JobResult::Failure { row_index, .. } => {
                *row_index
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobResult::Success { .. })
    }

    /// Failure stage, `None` for successes
    pub fn stage(&self) -> Option<Stage> {
        match self {
            JobResult::Success { .. } => None,
            JobResult::Failure { stage, .. } => Some(*stage),
        }
    }
}

/// Results of a whole batch, in original row order
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<JobResult>,
}

impl BatchReport {
    pub fn new(results: Vec<JobResult>, elapsed: Duration, started_at: DateTime<Utc>) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            started_at,
            elapsed,
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis().min(u64::MAX as u128) as u64)
}
