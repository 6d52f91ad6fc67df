//! Jurisdiction filter loading.

use std::collections::BTreeMap;
use std::io::Cursor;

use serde::Deserialize;

use bhd_model::FilterSpec;

use crate::embedded;
use crate::error::{Result, StandardsError};

const FILE: &str = "filters.csv";

#[derive(Debug, Deserialize)]
struct FilterCsvRow {
    dataset_id: String,
    column: String,
    accepted: String,
}

/// Load the embedded filter table keyed by dataset identifier.
pub fn load_filters() -> Result<BTreeMap<String, FilterSpec>> {
    load_filters_from_str(embedded::FILTERS)
}

fn load_filters_from_str(content: &str) -> Result<BTreeMap<String, FilterSpec>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(content.as_bytes()));

    let mut filters = BTreeMap::new();
    for result in reader.deserialize::<FilterCsvRow>() {
        let row = result.map_err(|e| StandardsError::CsvParse {
            file: FILE,
            message: e.to_string(),
        })?;
        let accepted: Vec<String> = row
            .accepted
            .split('|')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        if accepted.is_empty() || row.column.trim().is_empty() {
            return Err(StandardsError::InvalidValue {
                field: "accepted",
                value: row.dataset_id,
                file: FILE,
            });
        }
        filters.insert(
            row.dataset_id.trim().to_string(),
            FilterSpec {
                column: row.column.trim().to_string(),
                accepted,
            },
        );
    }
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_filters_load() {
        let filters = load_filters().unwrap();
        let abgar = &filters["abgar_noabd"];
        assert_eq!(abgar.column, "Geography");
        assert_eq!(abgar.accepted, vec!["Calaveras", "State"]);
        let acs = &filters["acs_5yr_estimates"];
        assert!(acs.accepts("Calaveras County"));
        assert!(!filters.contains_key("nsduh"));
    }

    #[test]
    fn rejects_empty_accepted_list() {
        let csv = "dataset_id,column,accepted\nx,County,|\n";
        assert!(load_filters_from_str(csv).is_err());
    }
}
