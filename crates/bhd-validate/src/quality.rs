//! Per-dataset data quality summary: missing values, storage types and IQR
//! outliers.

use std::fmt::Write as _;

use polars::prelude::{AnyValue, Column, DataFrame, DataType};

use bhd_common::any_is_null;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnQuality {
    pub name: String,
    pub dtype: String,
    pub missing: usize,
    /// Values outside `[q1 - 1.5 * iqr, q3 + 1.5 * iqr]`; `None` for
    /// non-numeric columns.
    pub outliers: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    pub dataset_id: String,
    pub rows: usize,
    pub columns: Vec<ColumnQuality>,
}

impl QualityReport {
    pub fn build(dataset_id: &str, df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|column| ColumnQuality {
                name: column.name().to_string(),
                dtype: column.dtype().to_string(),
                missing: missing_count(column),
                outliers: is_numeric(column.dtype()).then(|| outlier_count(column)),
            })
            .collect();
        Self {
            dataset_id: dataset_id.to_string(),
            rows: df.height(),
            columns,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// Render reports as one Markdown document.
pub fn render_markdown(reports: &[QualityReport]) -> String {
    let mut out = String::from("# Data Quality Report\n");
    for report in reports {
        let _ = write!(out, "\n## {}\n\n", report.dataset_id);
        if report.is_empty() {
            out.push_str("No data loaded.\n");
            continue;
        }
        let _ = writeln!(out, "Rows: {}\n", report.rows);
        out.push_str("| Column | Type | Missing | Outliers |\n");
        out.push_str("|--------|------|---------|----------|\n");
        for column in &report.columns {
            let outliers = column
                .outliers
                .map_or_else(|| "-".to_string(), |n| n.to_string());
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                column.name.replace('|', "\\|"),
                column.dtype,
                column.missing,
                outliers
            );
        }
    }
    out
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn missing_count(column: &Column) -> usize {
    (0..column.len())
        .filter(|&idx| any_is_null(&column.get(idx).unwrap_or(AnyValue::Null)))
        .count()
}

fn outlier_count(column: &Column) -> usize {
    let Ok(floats) = column.cast(&DataType::Float64) else {
        return 0;
    };
    let Ok(floats) = floats.f64() else {
        return 0;
    };
    let mut values: Vec<f64> = floats.into_iter().flatten().filter(|v| !v.is_nan()).collect();
    if values.is_empty() {
        return 0;
    }
    values.sort_by(f64::total_cmp);
    let q1 = quantile(&values, 0.25);
    let q3 = quantile(&values, 0.75);
    let iqr = q3 - q1;
    let (low, high) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
    values.iter().filter(|&&v| v < low || v > high).count()
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
