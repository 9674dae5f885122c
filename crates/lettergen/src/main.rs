mod cli;
mod commands;
mod logging;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Outcome;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Generate { job, json } => commands::generate::run(job, json, cli.verbose),
        Commands::One { row, job, json } => commands::one::run(row, job, json, cli.verbose),
        Commands::Fields {
            template,
            data,
            json,
        } => commands::fields::run(template, data, json),
    };

    match result {
        Ok(Outcome::Success) => {}
        Ok(Outcome::PartialFailure) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
