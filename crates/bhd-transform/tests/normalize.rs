//! End-to-end normalization of dataset-shaped tables.

use bhd_common::{column_names, text_series, text_values};
use bhd_transform::{normalize, standard_pipeline};
use polars::prelude::*;

fn text(name: &str, values: &[Option<&str>]) -> Column {
    text_series(name, values.iter().map(|v| v.map(str::to_string)).collect()).into_column()
}

fn test_df(columns: Vec<Column>) -> DataFrame {
    DataFrame::new(columns).unwrap()
}

#[test]
fn foster_care_header_row_is_detected() {
    let df = test_df(vec![
        text(
            "CFSR 4 Outcomes: Northern Region",
            &[None, Some("Measure number"), Some("S1"), Some("P4")],
        ),
        text(
            "Unnamed: 1",
            &[None, Some("Most recent numerator"), Some("12"), Some("3")],
        ),
        text(
            "Unnamed: 2",
            &[None, Some("Most recent denominator"), Some("40"), Some("0")],
        ),
        text(
            "Unnamed: 3",
            &[None, Some("One-year percent change"), Some("5.2%"), Some("-3%")],
        ),
    ]);

    let out = normalize("foster_care_entries_exits", df).unwrap();
    let names = column_names(&out);
    assert_eq!(
        &names[..4],
        [
            "Measure number",
            "Most recent numerator",
            "Most recent denominator",
            "One-year percent change"
        ]
    );
    assert_eq!(out.height(), 2);
    assert_eq!(
        text_values(out.column("Measure number").unwrap())[0].as_deref(),
        Some("S1")
    );

    let rate = out.column("Rate").unwrap();
    assert_eq!(rate.get(0).unwrap(), AnyValue::Float64(0.3));
    assert_eq!(rate.get(1).unwrap(), AnyValue::Null);

    let flags: Vec<Option<bool>> = out
        .column("OneYearChangeFlag")
        .unwrap()
        .bool()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(flags, vec![Some(true), Some(false)]);
}

#[test]
fn foster_care_header_below_title_and_blank_rows() {
    // Title in row 0, a blank spacer in row 1, the real header in row 2.
    let df = test_df(vec![
        text(
            "column_1",
            &[
                Some("CFSR 4 Outcomes: Northern Region"),
                None,
                Some("Measure number"),
                Some("S1"),
                Some("P4"),
            ],
        ),
        text(
            "column_2",
            &[None, None, Some("Most recent numerator"), Some("12"), Some("3")],
        ),
        text(
            "column_3",
            &[None, None, Some("Most recent denominator"), Some("40"), Some("0")],
        ),
    ]);

    let out = normalize("foster_care_entries_exits", df).unwrap();
    let names = column_names(&out);
    assert_eq!(
        &names[..3],
        [
            "Measure number",
            "Most recent numerator",
            "Most recent denominator"
        ]
    );
    assert_eq!(out.height(), 2);
    assert_eq!(
        text_values(out.column("Measure number").unwrap()),
        vec![Some("S1".to_string()), Some("P4".to_string())]
    );
    let rate = out.column("Rate").unwrap();
    assert_eq!(rate.get(0).unwrap(), AnyValue::Float64(0.3));
}

#[test]
fn suppressed_members_become_null_not_zero() {
    let df = test_df(vec![
        text("County", &[Some("Calaveras"), Some("Calaveras"), Some("Statewide")]),
        text("Year", &[Some("2022"), Some("2023"), Some("2023")]),
        text("members", &[Some("*"), Some("14"), Some("10,502")]),
    ]);
    let out = normalize("mat_annual", df).unwrap();
    let members = out.column("members").unwrap();
    assert_eq!(members.dtype(), &DataType::Float64);
    assert_eq!(members.get(0).unwrap(), AnyValue::Null);
    assert_eq!(members.get(1).unwrap(), AnyValue::Float64(14.0));
    assert_eq!(members.null_count(), 2);
}

#[test]
fn facility_capacity_metrics() {
    let df = test_df(vec![
        text("CountyName", &[Some("CALAVERAS"), Some("calaveras"), Some("Calaveras")]),
        text("County_Code", &[Some("5"), Some("5.0"), Some("05")]),
        text("Treatment_Capacity", &[Some("30"), Some("40"), Some("20")]),
        text("Total_Capacity", &[Some("0"), Some("50"), Some("51")]),
        text("Facility_Zip", &[Some("95249.0"), Some("95222"), None]),
        text(
            "Expiration_Date",
            &[Some("2026-06-30"), Some("not a date"), Some("12/31/2025")],
        ),
    ]);
    let out = normalize("sud_recovery_facilities", df).unwrap();

    let utilization = out.column("Capacity_Utilization").unwrap();
    assert_eq!(utilization.get(0).unwrap(), AnyValue::Null);
    assert_eq!(utilization.get(1).unwrap(), AnyValue::Float64(0.8));

    let large: Vec<Option<bool>> = out
        .column("Large_Facility")
        .unwrap()
        .bool()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(large, vec![Some(false), Some(false), Some(true)]);

    assert_eq!(
        text_values(out.column("CountyName").unwrap()),
        vec![Some("Calaveras".to_string()); 3]
    );
    assert_eq!(
        text_values(out.column("County_Code").unwrap()),
        vec![Some("05".to_string()); 3]
    );
    assert_eq!(
        text_values(out.column("Facility_Zip").unwrap())[0].as_deref(),
        Some("95249")
    );
    let years = out.column("Expiration_Year").unwrap();
    assert_eq!(years.get(1).unwrap(), AnyValue::Null);
    assert_eq!(years.get(2).unwrap(), AnyValue::Int32(2025));
}

#[test]
fn census_extract_reshape() {
    let df = test_df(vec![
        text("Label (Grouping)", &[Some("Total:"), None, Some("Hispanic or Latino")]),
        text(
            "Calaveras County, California",
            &[Some("45,292"), Some("1"), Some("5,838")],
        ),
    ]);
    let out = normalize("acs_5yr_estimates", df).unwrap();
    assert_eq!(column_names(&out), vec!["Label", "Value", "County"]);
    assert_eq!(out.height(), 2);
}

#[test]
fn core_set_text_cleanup() {
    let df = test_df(vec![
        text("Rate", &[Some("45.2%"), Some("NR")]),
        text("Numerator", &[Some("1,204"), None]),
        text("Denominator", &[Some("2,664"), Some("12")]),
    ]);
    let out = normalize("core_set_mental_health", df).unwrap();
    assert_eq!(
        text_values(out.column("Rate").unwrap()),
        vec![Some("45.2".to_string()), Some("NR".to_string())]
    );
    assert_eq!(
        text_values(out.column("Numerator").unwrap()),
        vec![Some("1204".to_string()), None]
    );
}

#[test]
fn provider_listing_cleanup() {
    let df = test_df(vec![
        text("County", &[Some("CALAVERAS")]),
        text("City", &[Some("SAN ANDREAS")]),
        text("ZIP", &[Some("95249")]),
        text("ZIP_4", &[Some("123.0")]),
        text("Phone_Number", &[Some("2097541234.0")]),
        text("Enroll_Status_Eff_DT", &[Some("01/15/2024")]),
        text("Latitude", &[Some("38.19")]),
    ]);
    let out = normalize("ffs_providers_profile", df).unwrap();
    assert_eq!(text_values(out.column("County").unwrap())[0].as_deref(), Some("Calaveras"));
    assert_eq!(text_values(out.column("City").unwrap())[0].as_deref(), Some("San Andreas"));
    assert_eq!(text_values(out.column("ZIP_4").unwrap())[0].as_deref(), Some("0123"));
    assert_eq!(
        text_values(out.column("Phone_Number").unwrap())[0].as_deref(),
        Some("2097541234")
    );
    assert_eq!(
        text_values(out.column("Enroll_Status_Eff_DT").unwrap())[0].as_deref(),
        Some("2024-01-15")
    );
    assert_eq!(out.column("Latitude").unwrap().dtype(), &DataType::Float64);
}

#[test]
fn pipeline_listing() {
    let listing: Vec<String> = standard_pipeline("sud_recovery_facilities")
        .rules_ordered()
        .iter()
        .map(|rule| format!("{:<10} {}", rule.stage.as_str(), rule.kind))
        .collect();
    insta::assert_snapshot!(listing.join("\n"), @r"
    generic    title case `county`
    generic    title case `CountyName`
    generic    title case `City`
    generic    zero pad `zip_code` to 5
    generic    zero pad `Facility_Zip` to 5
    generic    zero pad `ZIP` to 5
    generic    zero pad `ZIP_4` to 4
    generic    parse `Latitude` as real
    generic    parse `Longitude` as real
    dataset    zero pad `County_Code` to 2
    dataset    parse `Expiration_Date` as date
    dataset    title case `Facility_City`
    dataset    `Capacity_Utilization` = `Treatment_Capacity` / `Total_Capacity` rounded to 2
    dataset    `Expiration_Year` = year of `Expiration_Date`
    dataset    `Large_Facility` = `Total_Capacity` > 50
    ");
}
