use super::{Dataset, RowSource, data_error};
use crate::error::Result;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV file with a header row, UTF-8 with or without BOM
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RowSource for CsvSource {
    fn load(&self) -> Result<Dataset> {
        let bytes = std::fs::read(&self.path).map_err(|e| data_error(&self.path, e))?;
        parse_csv(&bytes).map_err(|e| data_error(&self.path, e))
    }
}

fn parse_csv(bytes: &[u8]) -> std::result::Result<Dataset, ::csv::Error> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    Ok(Dataset::from_records(headers, records))
}
