use colored::Colorize;
use lettergen_core::{BatchReport, JobResult};
use std::io::{self, Write};
use std::path::Path;

pub fn print_json(s: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{s}")
}

pub fn print_text(s: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{s}")
}

/// Final summary, failures listed in row order
pub fn print_summary(report: &BatchReport, output_dir: &Path) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out)?;

    let headline = format!(
        "{} of {} letter(s) generated in {:.1}s",
        report.succeeded,
        report.total(),
        report.elapsed.as_secs_f64()
    );
    if report.is_complete_success() {
        writeln!(out, "{} {}", "✓".green().bold(), headline)?;
    } else {
        writeln!(out, "{} {}", "✗".red().bold(), headline)?;
        for failure in report.failures() {
            if let JobResult::Failure {
                row_index,
                stage,
                error_detail,
            } = failure
            {
                writeln!(out, "  row {} ({}): {}", row_index, stage, error_detail)?;
            }
        }
    }

    if report.succeeded > 0 {
        writeln!(out, "  Output: {}", output_dir.display())?;
    }
    Ok(())
}
