use std::fs;
use std::path::Path;

use bhd_common::{column_names, text_values};
use bhd_ingest::{FailureCategory, IngestError, load};
use bhd_model::{DatasetDescriptor, Locator};

fn local(id: &str, path: &str) -> DatasetDescriptor {
    DatasetDescriptor::new(id, Locator::parse(path))
}

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn loads_csv_relative_to_downloads_dir() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "mat/annual.csv",
        "Year,County,members\n2022,Calaveras,*\n2022,Statewide,1200\n",
    );

    let loaded = load(&local("mat_annual", "mat/annual.csv"), dir.path()).unwrap();
    assert_eq!(loaded.table.height(), 2);
    assert_eq!(column_names(&loaded.table), vec!["Year", "County", "members"]);
    let members = text_values(loaded.table.column("members").unwrap());
    assert_eq!(members[0].as_deref(), Some("*"));
    assert!(loaded.modified.is_some());
    assert!(loaded.path.ends_with("mat/annual.csv"));
}

#[test]
fn honours_skip_rows_hint() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "core.csv",
        "Mental Health Core Set Measure Rates\nCounty,Rate\nCalaveras,45.1%\n",
    );
    let descriptor = local("core_set_mental_health", "core.csv").with_skip_rows(1);
    let loaded = load(&descriptor, dir.path()).unwrap();
    assert_eq!(column_names(&loaded.table), vec!["County", "Rate"]);
}

#[test]
fn sniffs_tab_separated_txt() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ocw.txt", "County\tVisits\nCalaveras\t14\n");
    let loaded = load(&local("crisis_service_utilization_ocw", "ocw.txt"), dir.path()).unwrap();
    assert_eq!(column_names(&loaded.table), vec!["County", "Visits"]);
}

#[test]
fn unavailable_locators_never_load() {
    let dir = tempfile::tempdir().unwrap();
    for raw in [
        "manual:https://www.hudexchange.info/",
        "restricted:CHIS confidential file",
        "https://data.chhs.ca.gov/x.csv",
        "missing/file.csv",
    ] {
        let err = load(&local("gap", raw), dir.path()).unwrap_err();
        assert_eq!(err.category(), FailureCategory::SourceUnavailable, "{raw}");
    }
}

#[test]
fn unknown_extension_is_decode_failure() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "report.pdf", "%PDF-1.7");
    let err = load(&local("report", "report.pdf"), dir.path()).unwrap_err();
    assert!(matches!(err, IngestError::UnsupportedFormat { .. }));
    assert_eq!(err.category(), FailureCategory::DecodeFailure);
}

#[test]
fn malformed_geojson_is_decode_failure() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "facilities.geojson", "{\"type\": \"FeatureCollection\"");
    let err = load(&local("sud", "facilities.geojson"), dir.path()).unwrap_err();
    assert!(matches!(err, IngestError::GeoJson { .. }));
}

#[test]
fn missing_workbook_sheet_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    // Not a real workbook; opening it fails before the sheet lookup.
    write(dir.path(), "acs.xlsx", "not a zip archive");
    let descriptor = local("acs_5yr_estimates", "acs.xlsx").with_sheet("Data");
    let err = load(&descriptor, dir.path()).unwrap_err();
    assert_eq!(err.category(), FailureCategory::DecodeFailure);
}
