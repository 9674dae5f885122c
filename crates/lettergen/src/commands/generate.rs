//! Generate command - render every data row

use super::{Outcome, prepare, run_batch};
use crate::cli::JobArgs;
use anyhow::Result;

pub fn run(job: JobArgs, json: bool, verbose: bool) -> Result<Outcome> {
    let prepared = prepare(&job, verbose)?;
    run_batch(&prepared, &prepared.rows, json)
}
