//! Shared helpers for the artifact writers.

use std::path::{Path, PathBuf};

use polars::prelude::{AnyValue, DataType};

use bhd_common::{any_is_null, any_to_string};

use crate::error::{ExportError, Result};

pub(crate) fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))
}

pub(crate) fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => create_dir(parent),
        _ => Ok(()),
    }
}

pub(crate) fn dataset_file(dir: &Path, dataset_id: &str, extension: &str) -> PathBuf {
    dir.join(format!("{dataset_id}.{extension}"))
}

/// Storage class of a column in formats with a fixed cell type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellKind {
    Integer,
    Real,
    Boolean,
    Text,
}

pub(crate) fn cell_kind(dtype: &DataType) -> CellKind {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => CellKind::Integer,
        DataType::Float32 | DataType::Float64 => CellKind::Real,
        DataType::Boolean => CellKind::Boolean,
        _ => CellKind::Text,
    }
}

/// A single cell normalized for writing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Text(String),
}

pub(crate) fn cell(value: AnyValue<'_>) -> Cell {
    if any_is_null(&value) {
        return Cell::Null;
    }
    match value {
        AnyValue::Boolean(b) => Cell::Boolean(b),
        AnyValue::Int8(v) => Cell::Integer(i64::from(v)),
        AnyValue::Int16(v) => Cell::Integer(i64::from(v)),
        AnyValue::Int32(v) => Cell::Integer(i64::from(v)),
        AnyValue::Int64(v) => Cell::Integer(v),
        AnyValue::UInt8(v) => Cell::Integer(i64::from(v)),
        AnyValue::UInt16(v) => Cell::Integer(i64::from(v)),
        AnyValue::UInt32(v) => Cell::Integer(i64::from(v)),
        AnyValue::UInt64(v) => match i64::try_from(v) {
            Ok(v) => Cell::Integer(v),
            Err(_) => Cell::Real(v as f64),
        },
        AnyValue::Float32(v) => real(f64::from(v)),
        AnyValue::Float64(v) => real(v),
        other => Cell::Text(any_to_string(other)),
    }
}

fn real(v: f64) -> Cell {
    if v.is_finite() { Cell::Real(v) } else { Cell::Null }
}
