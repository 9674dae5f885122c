//! Fields command - list template fields and check them against data headers

use super::Outcome;
use crate::output;
use anyhow::Result;
use colored::Colorize;
use lettergen_core::Template;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct FieldsOutput {
    fields: Vec<FieldInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct FieldInfo {
    name: String,
    required: bool,
}

pub fn run(template: PathBuf, data: Option<PathBuf>, json: bool) -> Result<Outcome> {
    let template = Template::load(&template)?;
    let required = template.required_fields();

    let fields: Vec<FieldInfo> = template
        .fields()
        .into_iter()
        .map(|name| FieldInfo {
            required: required.contains(&name),
            name,
        })
        .collect();

    let (headers, missing) = match data {
        Some(path) => {
            let dataset = lettergen_core::row::load_dataset(&path)?;
            let headers = dataset.headers().to_vec();
            let missing = fields
                .iter()
                .filter(|f| !headers.contains(&f.name))
                .map(|f| f.name.clone())
                .collect();
            (Some(headers), Some(missing))
        }
        None => (None, None),
    };

    let report = FieldsOutput {
        fields,
        headers,
        missing,
    };

    if json {
        output::print_json(&serde_json::to_string_pretty(&report)?)?;
    } else {
        print_fields(&report)?;
    }

    Ok(Outcome::Success)
}

fn print_fields(report: &FieldsOutput) -> std::io::Result<()> {
    output::print_text(&format!("{}", "Template fields:".bold()))?;
    if report.fields.is_empty() {
        output::print_text("  (none)")?;
    }
    for field in &report.fields {
        if field.required {
            output::print_text(&format!("  {} {}", field.name, "(required)".yellow()))?;
        } else {
            output::print_text(&format!("  {}", field.name))?;
        }
    }

    if let Some(headers) = &report.headers {
        output::print_text(&format!("\n{} {}", "Data headers:".bold(), headers.join(", ")))?;
    }

    if let Some(missing) = &report.missing {
        if missing.is_empty() {
            output::print_text(&format!("{} Every field has a data column", "✓".green().bold()))?;
        } else {
            for name in missing {
                output::print_text(&format!("{} No data column for '{}'", "✗".red().bold(), name))?;
            }
        }
    }

    Ok(())
}
