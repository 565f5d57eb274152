//! Record table loader
//!
//! CSV export of the grid spreadsheet → raw rows. Required columns default to
//! the spreadsheet's own headers: 격자코드 (grid code), 대상지 (site),
//! 거리구간 (distance band).

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use grid_core::{CalibrationRecord, GridCode, GridError};
use serde::{Deserialize, Serialize};

/// Column names in the record table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordColumns {
    pub code: String,
    pub reference: String,
    pub band: String,
}

impl Default for RecordColumns {
    fn default() -> Self {
        Self {
            code: "격자코드".to_string(),
            reference: "대상지".to_string(),
            band: "거리구간".to_string(),
        }
    }
}

/// One row as read from the file
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub code: String,
    pub reference_id: String,
    pub band_label: String,
}

#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    pub rows: Vec<RawRecord>,
}

impl RecordTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct grid codes, first occurrence order
    pub fn codes(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.rows
            .iter()
            .map(|r| r.code.trim())
            .filter(|code| seen.insert(*code))
            .collect()
    }

    /// Rows as calibration records. A malformed code fails the whole table.
    pub fn calibration_records(&self) -> grid_core::Result<Vec<CalibrationRecord>> {
        self.rows
            .iter()
            .map(|r| {
                let (row, col) = GridCode::parse(&r.code)?.indices();
                Ok(CalibrationRecord::new(
                    row,
                    col,
                    r.reference_id.trim(),
                    r.band_label.trim(),
                ))
            })
            .collect()
    }
}

/// Read records from any CSV source.
///
/// `require_labels = false` only demands the code column (analysis with a
/// saved decoder needs no band labels).
pub fn read_records<R: io::Read>(
    reader: R,
    columns: &RecordColumns,
    require_labels: bool,
) -> Result<RecordTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header row")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let mut needed = vec![columns.code.as_str()];
    if require_labels {
        needed.push(columns.reference.as_str());
        needed.push(columns.band.as_str());
    }
    let missing: Vec<String> = needed
        .iter()
        .filter(|name| position(**name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(GridError::Schema { missing }.into());
    }

    let code_idx = position(columns.code.as_str());
    let reference_idx = position(columns.reference.as_str());
    let band_idx = position(columns.band.as_str());

    let mut table = RecordTable::default();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", line + 2))?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };
        table.rows.push(RawRecord {
            code: field(code_idx),
            reference_id: field(reference_idx),
            band_label: field(band_idx),
        });
    }
    Ok(table)
}

pub fn load_records(path: &Path, columns: &RecordColumns, require_labels: bool) -> Result<RecordTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    read_records(file, columns, require_labels)
        .with_context(|| format!("Failed to load records from {}", path.display()))
}
