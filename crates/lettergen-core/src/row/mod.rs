//! Rows and row sources
//!
//! A [`Row`] is an immutable mapping from field name to text value. Row
//! sources turn a data file into a [`Dataset`]: the header list plus the rows
//! in source order. Every value is text; numbers and dates are rendered the
//! way a spreadsheet user reads them.

mod csv;
mod xlsx;

use crate::error::{LetterGenError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use self::csv::CsvSource;
pub use self::xlsx::XlsxSource;

/// One data record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    index: usize,
    fields: BTreeMap<String, String>,
}

impl Row {
    /// Create a row at ordinal `index` (0-based, source order)
    pub fn new<K, V>(index: usize, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            index,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

/// Header list plus rows in source order
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset from a raw header line and raw records
    ///
    /// Header cells are trimmed and blank header columns are dropped; when a
    /// header repeats, the first column wins. Records that are entirely empty
    /// are skipped, and short records read the missing cells as empty.
    pub fn from_records<I>(raw_headers: Vec<String>, records: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut headers: Vec<String> = Vec::new();
        let mut columns: Vec<(usize, String)> = Vec::new();
        for (col, header) in raw_headers.into_iter().enumerate() {
            let header = header.trim().to_string();
            if header.is_empty() || headers.contains(&header) {
                continue;
            }
            headers.push(header.clone());
            columns.push((col, header));
        }

        let mut rows = Vec::new();
        for record in records {
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            let fields = columns.iter().map(|(col, header)| {
                let value = record.get(*col).cloned().unwrap_or_default();
                (header.clone(), value)
            });
            rows.push(Row::new(rows.len(), fields));
        }

        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Anything that can produce a [`Dataset`]
pub trait RowSource {
    fn load(&self) -> Result<Dataset>;
}

/// Pick a row source by file extension
pub fn open_source(path: impl AsRef<Path>) -> Result<Box<dyn RowSource>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "txt" => Ok(Box::new(CsvSource::new(path))),
        "xlsx" | "xlsm" | "xls" => Ok(Box::new(XlsxSource::new(path))),
        _ => Err(LetterGenError::DataUnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Load a CSV or XLSX data file
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(data_error(path, "file not found"));
    }
    let dataset = open_source(path)?.load()?;
    tracing::debug!(
        path = %path.display(),
        rows = dataset.len(),
        headers = dataset.headers().len(),
        "loaded dataset"
    );
    Ok(dataset)
}

pub(crate) fn data_error(path: &Path, reason: impl std::fmt::Display) -> LetterGenError {
    LetterGenError::DataReadFailed {
        path: PathBuf::from(path),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_from_records_maps_headers() {
        let dataset = Dataset::from_records(
            strings(&["name", " amount "]),
            vec![strings(&["Alice", "10"]), strings(&["Bob", "20"])],
        );
        assert_eq!(dataset.headers(), &["name", "amount"]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[1].get("name"), Some("Bob"));
        assert_eq!(dataset.rows()[1].get("amount"), Some("20"));
        assert_eq!(dataset.rows()[1].index(), 1);
    }

    #[test]
    fn test_from_records_skips_blank_rows_and_keeps_indices_dense() {
        let dataset = Dataset::from_records(
            strings(&["name"]),
            vec![strings(&["A"]), strings(&["  "]), strings(&["C"])],
        );
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[1].get("name"), Some("C"));
        assert_eq!(dataset.rows()[1].index(), 1);
    }

    #[test]
    fn test_from_records_short_record_reads_empty() {
        let dataset = Dataset::from_records(strings(&["a", "b"]), vec![strings(&["1"])]);
        assert_eq!(dataset.rows()[0].get("b"), Some(""));
    }

    #[test]
    fn test_from_records_drops_blank_and_duplicate_headers() {
        let dataset = Dataset::from_records(
            strings(&["a", "", "a", "b"]),
            vec![strings(&["1", "x", "2", "3"])],
        );
        assert_eq!(dataset.headers(), &["a", "b"]);
        assert_eq!(dataset.rows()[0].get("a"), Some("1"));
        assert_eq!(dataset.rows()[0].get("b"), Some("3"));
    }

    #[test]
    fn test_open_source_rejects_unknown_extension() {
        match open_source("data.json") {
            Err(LetterGenError::DataUnsupportedFormat { .. }) => {}
            _ => panic!("Expected DataUnsupportedFormat"),
        }
    }
}
