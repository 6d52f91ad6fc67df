//! Schema registry loading.
//!
//! Column names are taken verbatim: several source headers carry leading or
//! trailing spaces or embedded newlines that must match exactly.

use std::collections::BTreeMap;
use std::io::Cursor;

use serde::Deserialize;

use bhd_model::{ColumnSpec, LogicalType, Schema};

use crate::embedded;
use crate::error::{Result, StandardsError};

const FILE: &str = "schemas.csv";

#[derive(Debug, Deserialize)]
struct SchemaCsvRow {
    dataset_id: String,
    column: String,
    logical_type: String,
    nullable: String,
}

/// Declared schemas keyed by dataset identifier.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Schema>,
}

impl SchemaRegistry {
    /// Load the embedded schema table.
    pub fn embedded() -> Result<Self> {
        Self::from_csv_str(embedded::SCHEMAS)
    }

    /// Parse a schema table. A row with an empty `column` registers the
    /// dataset with no declared columns.
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::None)
            .from_reader(Cursor::new(content.as_bytes()));

        let mut schemas: BTreeMap<String, Schema> = BTreeMap::new();
        for result in reader.deserialize::<SchemaCsvRow>() {
            let row = result.map_err(|e| StandardsError::CsvParse {
                file: FILE,
                message: e.to_string(),
            })?;
            let dataset_id = row.dataset_id.trim();
            if dataset_id.is_empty() {
                continue;
            }
            let schema = schemas
                .entry(dataset_id.to_string())
                .or_insert_with(|| Schema::new(dataset_id, Vec::new()));
            if row.column.is_empty() {
                continue;
            }
            let logical_type: LogicalType =
                row.logical_type
                    .parse()
                    .map_err(|_| StandardsError::InvalidValue {
                        field: "logical_type",
                        value: row.logical_type.clone(),
                        file: FILE,
                    })?;
            let nullable = parse_bool(&row.nullable).ok_or_else(|| StandardsError::InvalidValue {
                field: "nullable",
                value: row.nullable.clone(),
                file: FILE,
            })?;
            if schema.column(&row.column).is_some() {
                return Err(StandardsError::InvalidValue {
                    field: "column",
                    value: format!("{dataset_id}.{}", row.column),
                    file: FILE,
                });
            }
            schema.columns.push(ColumnSpec {
                name: row.column,
                logical_type,
                nullable,
            });
        }
        Ok(Self { schemas })
    }

    pub fn get(&self, dataset_id: &str) -> Option<&Schema> {
        self.schemas.get(dataset_id)
    }

    pub fn dataset_ids(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "yes" | "y" => Some(true),
        "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_schemas_load() {
        let registry = SchemaRegistry::embedded().unwrap();
        let mat = registry.get("mat_annual").unwrap();
        assert_eq!(mat.columns[0].name, "County");
        assert_eq!(mat.column("members").unwrap().logical_type, LogicalType::Real);
        let ffs = registry.get("ffs_providers_profile").unwrap();
        assert_eq!(
            ffs.column("Enroll_Status_Eff_DT").unwrap().logical_type,
            LogicalType::Date
        );
        assert_eq!(ffs.column("OBJECTID").unwrap().logical_type, LogicalType::Integer);
    }

    #[test]
    fn column_names_are_verbatim() {
        let registry = SchemaRegistry::embedded().unwrap();
        let managed = registry.get("managed_care_enrollment_report").unwrap();
        assert!(managed.column(" Count of Enrollees ").is_some());
        let foster = registry.get("foster_care_entries_exits").unwrap();
        assert!(foster.column("Actual \none-year direction").is_some());
    }

    #[test]
    fn empty_declarations_are_registered() {
        let registry = SchemaRegistry::embedded().unwrap();
        let nsduh = registry.get("nsduh").unwrap();
        assert!(nsduh.is_empty());
        assert!(registry.get("hud_pit_count").is_none());
    }

    #[test]
    fn rejects_unknown_types() {
        let csv = "dataset_id,column,logical_type,nullable\nx,a,blob,true\n";
        let err = SchemaRegistry::from_csv_str(csv).unwrap_err();
        assert!(matches!(err, StandardsError::InvalidValue { field: "logical_type", .. }));
    }

    #[test]
    fn parses_required_columns() {
        let csv = "dataset_id,column,logical_type,nullable\nx,a,int,false\nx,b,str,\n";
        let registry = SchemaRegistry::from_csv_str(csv).unwrap();
        let schema = registry.get("x").unwrap();
        assert!(!schema.columns[0].nullable);
        assert!(schema.columns[1].nullable);
    }
}
