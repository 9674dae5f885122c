//! One command - render a single data row through the batch pipeline

use super::{Outcome, prepare, run_batch};
use crate::cli::JobArgs;
use anyhow::Result;
use lettergen_core::LetterGenError;

pub fn run(row: usize, job: JobArgs, json: bool, verbose: bool) -> Result<Outcome> {
    let prepared = prepare(&job, verbose)?;

    let selected = prepared
        .rows
        .get(row)
        .ok_or(LetterGenError::RowOutOfRange {
            index: row,
            total: prepared.rows.len(),
        })?;

    run_batch(&prepared, std::slice::from_ref(selected), json)
}
