pub mod fields;
pub mod generate;
pub mod one;

use crate::cli::JobArgs;
use crate::output;
use anyhow::Result;
use colored::Colorize;
use lettergen_convert::NativeBackend;
use lettergen_core::{
    BatchConfig, BatchOptions, BatchReport, ConfigLayer, JobResult, JobScheduler, Progress,
    ProgressObserver, Row, Template,
};

/// How a command finished, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// At least one row failed (exit code 2)
    PartialFailure,
}

impl From<&BatchReport> for Outcome {
    fn from(report: &BatchReport) -> Self {
        if report.is_complete_success() {
            Outcome::Success
        } else {
            Outcome::PartialFailure
        }
    }
}

/// Merge job file, environment and flags into one configuration
pub fn resolve_config(job: &JobArgs) -> Result<BatchConfig> {
    let base = match &job.config {
        Some(path) => ConfigLayer::from_file(path)?,
        None => ConfigLayer::default(),
    };
    Ok(base.merge(job.to_layer()).into_config()?)
}

/// Everything a batch needs before the first row is dispatched
pub struct Prepared {
    pub config: BatchConfig,
    pub template: Template,
    pub rows: Vec<Row>,
    pub backend: NativeBackend,
}

/// Load template, data and converter; any failure here is fatal
pub fn prepare(job: &JobArgs, verbose: bool) -> Result<Prepared> {
    let config = resolve_config(job)?;

    if verbose {
        println!(
            "{} Loading template '{}'",
            "→".cyan(),
            config.template_path.display()
        );
    }
    let template = Template::load(&config.template_path)?;

    if verbose {
        println!("{} Reading '{}'", "→".cyan(), config.data_path.display());
    }
    let rows = lettergen_core::row::load_dataset(&config.data_path)?.into_rows();

    let backend = NativeBackend::from_settings(&config.pdf)?;
    if verbose {
        println!(
            "{} Using wkhtmltopdf at '{}'",
            "→".cyan(),
            backend.pdf().binary().display()
        );
    }

    Ok(Prepared {
        config,
        template,
        rows,
        backend,
    })
}

/// Run the scheduler over `rows` and print the report
pub fn run_batch(prepared: &Prepared, rows: &[Row], json: bool) -> Result<Outcome> {
    let console = ConsoleProgress;
    let mut scheduler =
        JobScheduler::new(&prepared.backend, BatchOptions::from(&prepared.config));
    if !json {
        scheduler = scheduler.with_observer(&console);
    }

    let report = scheduler.run(&prepared.template, rows)?;

    if json {
        output::print_json(&serde_json::to_string_pretty(&report)?)?;
    } else {
        output::print_summary(&report, &prepared.config.output_dir)?;
    }

    Ok(Outcome::from(&report))
}

/// One line per finished row, in completion order
struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn on_batch_start(&self, total: usize, workers: usize) {
        println!(
            "{} Generating {} letter(s) with {} worker(s)",
            "→".cyan(),
            total,
            workers
        );
    }

    fn on_result(&self, result: &JobResult, progress: Progress) {
        let counter = format!("[{}/{}]", progress.completed, progress.total);
        match result {
            JobResult::Success { row_index, name, .. } => println!(
                "{} {} row {} → {}",
                "✓".green().bold(),
                counter.dimmed(),
                row_index,
                name
            ),
            JobResult::Failure {
                row_index,
                stage,
                error_detail,
            } => println!(
                "{} {} row {} failed at {}: {}",
                "✗".red().bold(),
                counter.dimmed(),
                row_index,
                stage,
                error_detail
            ),
        }
    }
}
