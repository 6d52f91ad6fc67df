//! Source registry loading.

use std::collections::BTreeSet;
use std::io::Cursor;

use serde::Deserialize;

use bhd_model::Locator;

use crate::embedded;
use crate::error::{Result, StandardsError};

const FILE: &str = "sources.csv";

/// One registry row: where a dataset comes from and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub id: String,
    pub locator: Locator,
    pub sheet: Option<String>,
    pub skip_rows: usize,
    pub description: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceCsvRow {
    dataset_id: String,
    locator: String,
    sheet: String,
    skip_rows: String,
    description: String,
    notes: String,
}

/// Load the embedded source registry in registry order.
pub fn load_sources() -> Result<Vec<SourceEntry>> {
    load_sources_from_str(embedded::SOURCES)
}

fn load_sources_from_str(content: &str) -> Result<Vec<SourceEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(content.as_bytes()));

    let mut seen = BTreeSet::new();
    let mut entries = Vec::new();
    for result in reader.deserialize::<SourceCsvRow>() {
        let row = result.map_err(|e| StandardsError::CsvParse {
            file: FILE,
            message: e.to_string(),
        })?;
        let id = row.dataset_id.trim().to_string();
        if id.is_empty() {
            continue;
        }
        if !seen.insert(id.clone()) {
            return Err(StandardsError::InvalidValue {
                field: "dataset_id",
                value: id,
                file: FILE,
            });
        }
        let skip_rows = match row.skip_rows.trim() {
            "" => 0,
            raw => raw.parse().map_err(|_| StandardsError::InvalidValue {
                field: "skip_rows",
                value: raw.to_string(),
                file: FILE,
            })?,
        };
        entries.push(SourceEntry {
            id,
            locator: Locator::parse(&row.locator),
            sheet: non_empty(&row.sheet),
            skip_rows,
            description: row.description.trim().to_string(),
            notes: non_empty(&row.notes),
        });
    }
    Ok(entries)
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
