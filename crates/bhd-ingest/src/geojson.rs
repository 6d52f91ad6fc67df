//! GeoJSON FeatureCollection reader.
//!
//! Feature properties become columns in first-seen order; the geometry is
//! flattened into `geometry_type` and `geometry_coordinates` (JSON text).

use std::path::Path;

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use serde_json::{Map, Value};

use bhd_common::{format_numeric, text_series, unique_headers};

use crate::error::{IngestError, Result};

const GEOMETRY_TYPE: &str = "geometry_type";
const GEOMETRY_COORDINATES: &str = "geometry_coordinates";

pub fn read_geojson(path: &Path) -> Result<DataFrame> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_slice(&bytes).map_err(|e| IngestError::GeoJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    features_to_frame(&document).map_err(|message| IngestError::GeoJson {
        path: path.to_path_buf(),
        message,
    })
}

fn features_to_frame(document: &Value) -> std::result::Result<DataFrame, String> {
    let features = document
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| "expected a FeatureCollection with a `features` array".to_string())?;

    let mut names: Vec<String> = Vec::new();
    let mut rows: Vec<Map<String, Value>> = Vec::with_capacity(features.len());
    for (idx, feature) in features.iter().enumerate() {
        let mut row = match feature.get("properties") {
            Some(Value::Object(props)) => props.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(_) => return Err(format!("feature {idx}: `properties` is not an object")),
        };
        let geometry = feature.get("geometry").filter(|g| !g.is_null());
        row.insert(
            GEOMETRY_TYPE.to_string(),
            geometry
                .and_then(|g| g.get("type"))
                .cloned()
                .unwrap_or(Value::Null),
        );
        row.insert(
            GEOMETRY_COORDINATES.to_string(),
            geometry
                .and_then(|g| g.get("coordinates"))
                .map(|c| Value::String(c.to_string()))
                .unwrap_or(Value::Null),
        );
        for key in row.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
        rows.push(row);
    }

    // Geometry columns always trail the properties.
    names.retain(|n| n != GEOMETRY_TYPE && n != GEOMETRY_COORDINATES);
    names.push(GEOMETRY_TYPE.to_string());
    names.push(GEOMETRY_COORDINATES.to_string());
    if rows.is_empty() {
        return Ok(DataFrame::empty());
    }

    let headers = unique_headers(&names);
    let columns: Vec<Column> = names
        .iter()
        .zip(&headers)
        .map(|(key, header)| {
            let cells: Vec<&Value> = rows
                .iter()
                .map(|row| row.get(key).unwrap_or(&Value::Null))
                .collect();
            build_column(header, &cells).into_column()
        })
        .collect();
    DataFrame::new(columns).map_err(|e| e.to_string())
}

fn build_column(name: &str, cells: &[&Value]) -> Series {
    let present: Vec<&&Value> = cells.iter().filter(|v| !v.is_null()).collect();
    if !present.is_empty() && present.iter().all(|v| v.is_number()) {
        let values: Vec<Option<f64>> = cells.iter().map(|v| v.as_f64()).collect();
        return Series::new(name.into(), values);
    }
    if !present.is_empty() && present.iter().all(|v| v.is_boolean()) {
        let values: Vec<Option<bool>> = cells.iter().map(|v| v.as_bool()).collect();
        return Series::new(name.into(), values);
    }
    let values: Vec<Option<String>> = cells.iter().map(|v| value_text(v)).collect();
    text_series(name, values)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_f64().map(format_numeric),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
