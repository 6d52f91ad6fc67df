//! Normalized tables validated against the embedded schemas.

use bhd_common::text_series;
use bhd_model::{IssueSeverity, ViolationKind};
use bhd_standards::SchemaRegistry;
use bhd_transform::normalize;
use bhd_validate::{empty_frame, validate};
use polars::prelude::*;

fn text(name: &str, values: &[Option<&str>]) -> Column {
    text_series(name, values.iter().map(|v| v.map(str::to_string)).collect()).into_column()
}

#[test]
fn suppressed_members_validate_cleanly() {
    let schemas = SchemaRegistry::embedded().unwrap();
    let raw = DataFrame::new(vec![
        text("County", &[Some("Calaveras"), Some("Statewide")]),
        text("Year", &[Some("2023"), Some("2023")]),
        text("members", &[Some("*"), Some("10502")]),
    ])
    .unwrap();

    let cleaned = normalize("mat_annual", raw).unwrap();
    let outcome = validate(schemas.get("mat_annual"), cleaned);

    assert!(outcome.violations.is_empty());
    let members = outcome.table.column("members").unwrap();
    assert_eq!(members.dtype(), &DataType::Float64);
    assert_eq!(members.get(0).unwrap(), AnyValue::Null);
}

#[test]
fn facility_rows_report_bad_identifiers() {
    let schemas = SchemaRegistry::embedded().unwrap();
    let raw = DataFrame::new(vec![
        text("OBJECTID", &[Some("1"), Some("two"), Some("3")]),
        text("CountyName", &[Some("CALAVERAS"); 3]),
        text("Total_Capacity", &[Some("12"), Some("60"), Some("6")]),
        text("Treatment_Capacity", &[Some("6"), Some("30"), Some("6")]),
        text(
            "Expiration_Date",
            &[Some("2026-06-30"), Some("2025-12-31"), Some("2027-01-01")],
        ),
    ])
    .unwrap();

    let cleaned = normalize("sud_recovery_facilities", raw).unwrap();
    let outcome = validate(schemas.get("sud_recovery_facilities"), cleaned);

    let issues = outcome.issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].column, "OBJECTID");
    assert_eq!(issues[0].kind, ViolationKind::TypeMismatch);
    assert_eq!(issues[0].severity, IssueSeverity::Error);
    assert_eq!(issues[0].samples, vec!["two"]);

    assert_eq!(
        outcome.table.column("Expiration_Date").unwrap().dtype(),
        &DataType::Date
    );
    assert_eq!(
        outcome.table.column("Total_Capacity").unwrap().dtype(),
        &DataType::Int64
    );
    // Derived columns are not declared and pass through.
    assert!(outcome.table.column("Capacity_Utilization").is_ok());
}

#[test]
fn unavailable_dataset_becomes_empty_table() {
    let schemas = SchemaRegistry::embedded().unwrap();
    let schema = schemas.get("abgar_appeals").unwrap();
    let outcome = validate(Some(schema), empty_frame(schema));
    assert!(outcome.empty);
    assert_eq!(outcome.violation_count(), 0);
    assert_eq!(outcome.table.width(), schema.len());
}
