//! CSV export directory adapter.
//!
//! Every file in the directory whose name ends with the configured suffix is
//! one batch. Rows are passed through untouched (header included) so that
//! arity and field errors surface as malformed records in the loader.

use crate::domain::error::{FlowError, RecordError};
use crate::ports::row_source::{RowBatch, RowSource};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
    suffix: String,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf, suffix: impl Into<String>) -> Self {
        Self {
            base_path,
            suffix: suffix.into(),
        }
    }

    /// Matching file names, sorted.
    pub fn list_files(&self) -> Result<Vec<String>, FlowError> {
        if !self.base_path.is_dir() {
            return Err(FlowError::MissingDataDirectory {
                path: self.base_path.display().to_string(),
            });
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(&self.suffix) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    fn read_batch(&self, name: &str) -> Result<RowBatch, FlowError> {
        let path = self.base_path.join(name);
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| FlowError::Io(e.into()))?;

        let mut rows: Vec<Vec<String>> = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| row_error(name, rows.len() + 1, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(RowBatch::new(name, rows))
    }
}

/// Read failures stay I/O errors; anything the reader rejects inside a row
/// (such as invalid UTF-8) is a malformed record at that line.
fn row_error(name: &str, next_line: usize, err: csv::Error) -> FlowError {
    if err.is_io_error() {
        return FlowError::Io(err.into());
    }
    let line = err
        .position()
        .and_then(|p| usize::try_from(p.line()).ok())
        .unwrap_or(next_line);
    FlowError::MalformedRecord {
        source_name: name.to_string(),
        line,
        reason: RecordError::Unreadable {
            reason: err.to_string(),
        },
    }
}

impl RowSource for CsvAdapter {
    fn fetch_batches(&self) -> Result<Vec<RowBatch>, FlowError> {
        let names = self.list_files()?;
        log::info!(
            "found {} {} files in {}",
            names.len(),
            self.suffix,
            self.base_path.display()
        );
        names.iter().map(|name| self.read_batch(name)).collect()
    }
}
