use super::commit::commit_pair;
use super::error::JobError;
use super::progress::{Progress, ProgressObserver};
use super::report::{BatchReport, JobResult, Stage};
use super::{BatchOptions, CancellationToken};
use crate::config::consts::workers::MAX_FACTOR;
use crate::convert::{ConversionBackend, ConversionError, ConversionKind};
use crate::error::{LetterGenError, Result};
use crate::naming::{NameRegistry, output_paths, plan_names};
use crate::row::Row;
use crate::template::Template;
use chrono::Utc;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Runs batches against one conversion backend
pub struct JobScheduler<'a> {
    backend: &'a dyn ConversionBackend,
    options: BatchOptions,
    observer: Option<&'a dyn ProgressObserver>,
    cancel: CancellationToken,
}

/// Worker count actually used: `max(1, min(requested, cores * 2))`, never
/// more than there are rows
pub fn effective_workers(requested: usize, rows: usize) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    requested
        .min(cores.saturating_mul(MAX_FACTOR))
        .min(rows)
        .max(1)
}

struct Shared<'s> {
    template: &'s Template,
    rows: &'s [Row],
    names: &'s [String],
    registry: &'s NameRegistry,
    output_dir: &'s Path,
    next: AtomicUsize,
    completed: AtomicUsize,
    slots: Mutex<Vec<Option<JobResult>>>,
}

impl<'a> JobScheduler<'a> {
    pub fn new(backend: &'a dyn ConversionBackend, options: BatchOptions) -> Self {
        Self {
            backend,
            options,
            observer: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this scheduler's batches
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Process every row
    ///
    /// Errors only for configuration-level problems found before any row is
    /// dispatched. Row failures are reported in the returned [`BatchReport`].
    pub fn run(&self, template: &Template, rows: &[Row]) -> Result<BatchReport> {
        let clock = Instant::now();
        let started_at = Utc::now();

        if self.options.filename_field.trim().is_empty() {
            return Err(LetterGenError::ConfigInvalidValue {
                field: "filename_field".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let output_dir = &self.options.output_dir;
        std::fs::create_dir_all(output_dir).map_err(|source| {
            LetterGenError::OutputDirUnavailable {
                path: output_dir.clone(),
                source,
            }
        })?;

        let names = plan_names(rows, &self.options.filename_field);
        let registry = NameRegistry::new(output_dir, self.options.existing_files, &names);
        let workers = effective_workers(self.options.worker_count, rows.len());

        tracing::info!(
            rows = rows.len(),
            workers,
            output_dir = %output_dir.display(),
            "starting batch"
        );
        if let Some(observer) = self.observer {
            observer.on_batch_start(rows.len(), workers);
        }

        let shared = Shared {
            template,
            rows,
            names: &names,
            registry: &registry,
            output_dir,
            next: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            slots: Mutex::new(vec![None; rows.len()]),
        };

        if !rows.is_empty() {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("lettergen-worker-{}", i))
                .build()
                .map_err(|e| LetterGenError::WorkerPool(e.to_string()))?;

            pool.scope(|scope| {
                for _ in 0..workers {
                    scope.spawn(|_| self.worker_loop(&shared));
                }
            });
        }

        let slots = shared
            .slots
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let results = self.finish_slots(slots, rows);

        let report = BatchReport::new(results, clock.elapsed(), started_at);
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "batch finished"
        );
        if let Some(observer) = self.observer {
            observer.on_batch_finish(&report);
        }
        Ok(report)
    }

    fn worker_loop(&self, shared: &Shared<'_>) {
        let total = shared.rows.len();
        loop {
            if self.cancel.is_cancelled() {
                tracing::debug!("cancellation requested, worker stopping");
                return;
            }
            let position = shared.next.fetch_add(1, Ordering::SeqCst);
            if position >= total {
                return;
            }

            let result = self.process_row(shared, position);
            let completed = shared.completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(observer) = self.observer {
                observer.on_result(&result, Progress { completed, total });
            }

            let mut slots = shared
                .slots
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            slots[position] = Some(result);
        }
    }

    fn process_row(&self, shared: &Shared<'_>, position: usize) -> JobResult {
        let row = &shared.rows[position];
        let clock = Instant::now();

        let mut stage = Stage::Render;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_stages(shared, row, &shared.names[position], &mut stage)
        }));

        match outcome {
            Ok(Ok((name, pdf_path, docx_path))) => {
                let duration = clock.elapsed();
                tracing::debug!(row = row.index(), name = %name, ?duration, "row done");
                JobResult::Success {
                    row_index: row.index(),
                    name,
                    pdf_path,
                    docx_path,
                    duration,
                }
            }
            Ok(Err(e)) => {
                let stage = e.stage();
                tracing::warn!(row = row.index(), %stage, error = %e, "row failed");
                JobResult::Failure {
                    row_index: row.index(),
                    stage,
                    error_detail: e.to_string(),
                }
            }
            Err(payload) => {
                let detail = format!("panicked: {}", panic_message(payload.as_ref()));
                tracing::warn!(row = row.index(), %stage, error = %detail, "row panicked");
                JobResult::Failure {
                    row_index: row.index(),
                    stage,
                    error_detail: detail,
                }
            }
        }
    }

    fn run_stages(
        &self,
        shared: &Shared<'_>,
        row: &Row,
        planned: &str,
        stage: &mut Stage,
    ) -> std::result::Result<(String, PathBuf, PathBuf), JobError> {
        tracing::debug!(row = row.index(), "rendering");
        *stage = Stage::Render;
        let html = shared.template.render(row)?;

        tracing::debug!(row = row.index(), planned, "resolving name");
        *stage = Stage::NameResolution;
        let name = shared.registry.claim(planned)?;
        let (pdf_path, docx_path) = output_paths(shared.output_dir, &name);

        tracing::debug!(row = row.index(), "converting to pdf");
        *stage = Stage::PdfConversion;
        let pdf = self
            .backend
            .to_pdf(&html)
            .map_err(|e| as_kind(e, ConversionKind::Pdf))?;

        tracing::debug!(row = row.index(), "converting to docx");
        *stage = Stage::DocxConversion;
        let docx = self
            .backend
            .to_docx(&html)
            .map_err(|e| as_kind(e, ConversionKind::Docx))?;

        tracing::debug!(row = row.index(), "writing");
        *stage = Stage::Write;
        commit_pair(shared.output_dir, &pdf_path, &pdf, &docx_path, &docx)?;

        Ok((name, pdf_path, docx_path))
    }

    /// Fill never-dispatched rows in as cancelled
    fn finish_slots(&self, slots: Vec<Option<JobResult>>, rows: &[Row]) -> Vec<JobResult> {
        let total = rows.len();
        let mut completed = slots.iter().filter(|s| s.is_some()).count();

        slots
            .into_iter()
            .zip(rows)
            .map(|(slot, row)| match slot {
                Some(result) => result,
                None => {
                    let result = JobResult::Failure {
                        row_index: row.index(),
                        stage: Stage::Cancelled,
                        error_detail: "batch cancelled before the row was dispatched".to_string(),
                    };
                    completed += 1;
                    if let Some(observer) = self.observer {
                        observer.on_result(&result, Progress { completed, total });
                    }
                    result
                }
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

/// Stage follows the call that failed, whatever kind the backend reported
fn as_kind(error: ConversionError, kind: ConversionKind) -> ConversionError {
    ConversionError { kind, ..error }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_payloads() {
        let literal = panic::catch_unwind(|| panic!("static text")).unwrap_err();
        assert_eq!(panic_message(literal.as_ref()), "static text");

        let formatted = panic::catch_unwind(|| panic!("row {}", 7)).unwrap_err();
        assert_eq!(panic_message(formatted.as_ref()), "row 7");

        let other = panic::catch_unwind(|| std::panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }

    #[test]
    fn test_effective_workers_bounds() {
        assert_eq!(effective_workers(0, 10), 1);
        assert_eq!(effective_workers(4, 2), 2);
        assert_eq!(effective_workers(3, 0), 1);
        assert!(effective_workers(10_000, 10_000) <= 2 * num_cores());
    }

    fn num_cores() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}
