//! Spreadsheet reader (xlsx, xlsm, xls, xlsb, ods) built on calamine.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate};
use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use tracing::debug;

use bhd_common::{format_numeric, text_series, unique_headers};

use crate::error::{IngestError, Result};

/// Read one worksheet. The first row is the header; a column whose non-empty
/// cells are all numeric becomes Float64, everything else is text.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IngestError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|name| name.as_str() == wanted)
            .cloned()
            .ok_or_else(|| IngestError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: wanted.to_string(),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IngestError::Workbook {
                path: path.to_path_buf(),
                message: "workbook has no sheets".to_string(),
            })?,
    };
    debug!(path = %path.display(), sheet = %sheet_name, "reading worksheet");

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let rows: Vec<Vec<Data>> = range.rows().map(<[Data]>::to_vec).collect();
    Ok(build_frame(&rows)?)
}

fn build_frame(rows: &[Vec<Data>]) -> polars::prelude::PolarsResult<DataFrame> {
    let Some((header, body)) = rows.split_first() else {
        return Ok(DataFrame::empty());
    };
    let names = unique_headers(header.iter().map(header_text));

    let mut columns: Vec<Column> = Vec::with_capacity(names.len());
    for (idx, name) in names.iter().enumerate() {
        let cells: Vec<&Data> = body
            .iter()
            .map(|row| row.get(idx).unwrap_or(&Data::Empty))
            .collect();
        columns.push(build_column(name, &cells).into_column());
    }
    DataFrame::new(columns)
}

fn build_column(name: &str, cells: &[&Data]) -> Series {
    let all_numeric = cells.iter().any(|cell| !is_empty(cell))
        && cells
            .iter()
            .all(|cell| is_empty(cell) || numeric_value(cell).is_some());
    if all_numeric {
        let values: Vec<Option<f64>> = cells.iter().map(|cell| numeric_value(cell)).collect();
        Series::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells.iter().map(|cell| cell_text(cell)).collect();
        text_series(name, values)
    }
}

fn is_empty(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn numeric_value(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(v) => Some(*v as f64),
        Data::Float(v) => Some(*v),
        _ => None,
    }
}

fn header_text(cell: &Data) -> String {
    cell_text(cell).unwrap_or_default()
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(v) => Some(v.to_string()),
        Data::Float(v) => Some(format_numeric(*v)),
        Data::Bool(v) => Some(v.to_string()),
        Data::DateTime(dt) => Some(
            serial_to_date(dt.as_f64())
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| format_numeric(dt.as_f64())),
        ),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Error(_) => None,
    }
}

/// Convert an Excel serial day number (1900 date system) to a calendar date.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Serial 60 is the phantom 1900-02-29; the 1899-12-30 base absorbs it for
    // every later date.
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::days(serial.trunc() as i64))
}
