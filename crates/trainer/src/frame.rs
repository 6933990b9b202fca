//! Column-named table of optional text cells
//!
//! Raw disclosure and price tables are small enough to hold in memory as
//! text; typing happens later, once the cleaning steps have decided which
//! rows survive. Empty CSV cells are read as missing.

use crate::errors::{Result, TrainerError};
use std::path::Path;
use tracing::debug;

/// One row of a [`Frame`]
pub type Row = Vec<Option<String>>;

/// In-memory table with ordered columns and ordered rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Frame {
    /// Build a frame, checking every row has one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(TrainerError::Parse {
                column: "*".to_string(),
                row: idx,
                message: format!("expected {} cells, found {}", columns.len(), row.len()),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Load a CSV file with a header row.
    ///
    /// A leading unnamed index column (`Unnamed: 0` or an empty header),
    /// as written by dataframe exports, is dropped.
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TrainerError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let skip_index = headers
            .first()
            .map(|h| h.is_empty() || h.starts_with("Unnamed: 0"))
            .unwrap_or(false);
        let skip = usize::from(skip_index);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .skip(skip)
                    .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                    .collect(),
            );
        }

        debug!(path = %path.display(), rows = rows.len(), "CSV loaded");
        Self::new(headers.into_iter().skip(skip).collect(), rows)
    }

    /// Write the frame as CSV; missing cells become empty fields.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name`, or [`TrainerError::MissingColumn`].
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TrainerError::MissingColumn(name.to_string()))
    }

    /// Cell at `(row, column)`; `None` when missing.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }

    /// Same columns, rows kept where `keep` returns true.
    pub fn filter_rows<'a, F>(&'a self, mut keep: F) -> Self
    where
        F: FnMut(&'a Row) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(*r)).cloned().collect(),
        }
    }

    /// Required text cell; missing values are a parse error.
    pub fn required(&self, row: usize, column: usize) -> Result<&str> {
        self.cell(row, column).ok_or_else(|| TrainerError::Parse {
            column: self.columns[column].clone(),
            row,
            message: "missing value".to_string(),
        })
    }
}
