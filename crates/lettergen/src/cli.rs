//! CLI command structure using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use lettergen_core::{ConfigLayer, ExistingFilePolicy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lettergen")]
#[command(version, about = "Generate a PDF and DOCX letter per data row", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render every data row to a PDF/DOCX pair
    Generate {
        #[command(flatten)]
        job: JobArgs,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a single data row
    One {
        /// Row index, 0-based, header excluded
        #[arg(long)]
        row: usize,

        #[command(flatten)]
        job: JobArgs,

        #[arg(long)]
        json: bool,
    },

    /// List template fields, optionally checked against a data file
    Fields {
        #[arg(long)]
        template: PathBuf,

        /// Data file whose headers are compared with the template fields
        #[arg(long)]
        data: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
}

/// Batch settings; flags override `LETTERGEN_*` variables, which override
/// the `--config` job file
#[derive(Args, Debug, Clone, Default)]
pub struct JobArgs {
    /// HTML template
    #[arg(short, long, env = "LETTERGEN_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// CSV or XLSX data file
    #[arg(short, long, env = "LETTERGEN_DATA")]
    pub data: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, env = "LETTERGEN_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Data column used to name output files
    #[arg(long, env = "LETTERGEN_FILENAME_FIELD")]
    pub filename_field: Option<String>,

    /// Parallel workers
    #[arg(short, long, env = "LETTERGEN_WORKERS")]
    pub workers: Option<usize>,

    /// What to do when an output file already exists
    #[arg(long, value_enum, env = "LETTERGEN_EXISTING")]
    pub existing: Option<ExistingArg>,

    /// TOML job file
    #[arg(short, long, env = "LETTERGEN_CONFIG")]
    pub config: Option<PathBuf>,
}

impl JobArgs {
    /// The command-line layer, without the job file
    pub fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            template_path: self.template.clone(),
            data_path: self.data.clone(),
            output_dir: self.output.clone(),
            filename_field: self.filename_field.clone(),
            worker_count: self.workers,
            existing_files: self.existing.map(Into::into),
            pdf: None,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingArg {
    Overwrite,
    Disambiguate,
    Fail,
}

impl From<ExistingArg> for ExistingFilePolicy {
    fn from(arg: ExistingArg) -> Self {
        match arg {
            ExistingArg::Overwrite => ExistingFilePolicy::Overwrite,
            ExistingArg::Disambiguate => ExistingFilePolicy::Disambiguate,
            ExistingArg::Fail => ExistingFilePolicy::Fail,
        }
    }
}
