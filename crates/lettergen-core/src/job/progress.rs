use super::report::{BatchReport, JobResult};

/// How far a batch has got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Receives batch events
///
/// `on_result` is called from worker threads as each row finishes, so
/// completion order is not row order.
pub trait ProgressObserver: Send + Sync {
    fn on_batch_start(&self, _total: usize, _workers: usize) {}

    fn on_result(&self, result: &JobResult, progress: Progress);

    fn on_batch_finish(&self, _report: &BatchReport) {}
}
