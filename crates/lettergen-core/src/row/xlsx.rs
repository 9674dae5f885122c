use super::{Dataset, RowSource, data_error};
use crate::error::Result;
use calamine::{Data, Reader, open_workbook_auto};
use chrono::Timelike;
use std::path::{Path, PathBuf};

/// Spreadsheet workbook; the first worksheet is read, first row is the header
#[derive(Debug, Clone)]
pub struct XlsxSource {
    path: PathBuf,
}

impl XlsxSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RowSource for XlsxSource {
    fn load(&self) -> Result<Dataset> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| data_error(&self.path, e))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| data_error(&self.path, "workbook has no worksheets"))?
            .map_err(|e| data_error(&self.path, e))?;

        let mut rows = range.rows();
        let headers = match rows.next() {
            Some(header_row) => header_row.iter().map(cell_text).collect(),
            None => Vec::new(),
        };
        let records = rows.map(|cells| cells.iter().map(cell_text).collect::<Vec<_>>());

        Ok(Dataset::from_records(headers, records))
    }
}

/// Render a cell the way it reads in the spreadsheet
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.time().num_seconds_from_midnight() == 0 => {
                value.format("%Y-%m-%d").to_string()
            }
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => float_text(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
    }
}

/// Integral floats print without a fractional part (`42`, not `42.0`)
fn float_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
