//! Tests for bhd-model types.

use bhd_model::{
    ColumnSpec, DatasetDescriptor, FilterSpec, LoadStatus, Locator, LogicalType, Schema,
    Violation, ViolationKind,
};

#[test]
fn descriptor_serializes() {
    let descriptor = DatasetDescriptor::new("mat_annual", Locator::parse("mat/annual.csv"))
        .with_schema(Schema::new(
            "mat_annual",
            vec![ColumnSpec::new("members", LogicalType::Real)],
        ))
        .with_filter(FilterSpec::new("County", &["Calaveras", "Statewide"]));
    let json = serde_json::to_string(&descriptor).expect("serialize descriptor");
    assert!(json.contains("\"kind\":\"local_path\""));
    assert!(json.contains("\"logical_type\":\"real\""));
    let round: DatasetDescriptor = serde_json::from_str(&json).expect("deserialize descriptor");
    assert_eq!(round, descriptor);
}

#[test]
fn violation_serializes_kind_in_snake_case() {
    let violation = Violation {
        column: "OBJECTID".to_string(),
        row_index: 4,
        kind: ViolationKind::TypeMismatch,
        value: Some("n/a".to_string()),
    };
    let json = serde_json::to_value(&violation).expect("serialize violation");
    assert_eq!(json["kind"], "type_mismatch");
    assert_eq!(json["row_index"], 4);
}

#[test]
fn load_status_labels() {
    assert_eq!(LoadStatus::Loaded.label(), "loaded");
    assert_eq!(
        LoadStatus::Unavailable("manual download".to_string()).label(),
        "unavailable"
    );
    let json = serde_json::to_value(LoadStatus::Failed("bad sheet".to_string())).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["reason"], "bad sheet");
}
