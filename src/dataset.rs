//! Row/column input boundary.
//!
//! The engine treats parsed rows as opaque input. This module only hands file
//! reading to the `csv` crate (or serde for JSON) and checks the column set.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::error::EnrichError;

/// One spreadsheet line keyed by column name.
pub type Row = BTreeMap<String, String>;

/// Parsed upload: ordered unique columns plus the rows that use them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, EnrichError> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(EnrichError::InvalidInput(format!(
                    "duplicate column name `{column}`"
                )));
            }
        }
        Ok(Self { columns, rows })
    }
}

/// Cell value for `column`, empty when the row has no such cell.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or_default()
}

/// Load a dataset from `.csv` or `.json`, chosen by extension.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let dataset = match extension.as_deref() {
        Some("csv") => read_csv(path)?,
        Some("json") => read_json(path)?,
        _ => {
            return Err(anyhow!(
                "unsupported input {} (expected .csv or .json)",
                path.display()
            ))
        }
    };
    tracing::info!(
        path = %path.display(),
        columns = dataset.columns.len(),
        rows = dataset.rows.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

fn read_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("read header row of {}", path.display()))?
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let header = if idx == 0 {
                header.trim_start_matches('\u{feff}')
            } else {
                header
            };
            header.trim().to_string()
        })
        .collect();
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("read record {} of {}", idx + 1, path.display()))?;
        let row: Row = columns
            .iter()
            .zip(record.iter())
            .map(|(column, value)| (column.clone(), value.to_string()))
            .collect();
        rows.push(row);
    }
    Dataset::new(columns, rows).map_err(anyhow::Error::from)
}

fn read_json(path: &Path) -> Result<Dataset> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let raw: Dataset = serde_json::from_slice(&bytes).context("parse dataset JSON")?;
    Dataset::new(raw.columns, raw.rows).map_err(anyhow::Error::from)
}
