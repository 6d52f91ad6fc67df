//! Structural rules that change a table's shape rather than its cells.

use polars::prelude::{AnyValue, BooleanChunked, DataFrame, NamedFrom, NewChunkedArray, Series};
use tracing::debug;

use bhd_common::{
    any_to_f64, column_names, replace_column, text_series, text_values, unique_headers,
};

use crate::error::Result;
use crate::normalization::parse_thousands;

/// Reshape a two-column census extract into `Label`, `Value` and `County`.
///
/// The second header names the geography (`"Calaveras County, California"`);
/// the text before its first comma becomes the `County` value for every row.
/// Rows without a label are dropped. Tables that already start with
/// `Label`/`Value` are returned unchanged.
pub fn reshape_label_value(df: DataFrame) -> Result<DataFrame> {
    let names = column_names(&df);
    if names.len() < 2 {
        debug!(columns = names.len(), "too few columns for label/value reshape");
        return Ok(df);
    }
    if names[0] == "Label" && names[1] == "Value" {
        return Ok(df);
    }

    let county = names[1]
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    let height = df.height();
    let labels = text_values(df.column(&names[0])?);
    let value_column = df.column(&names[1])?;
    let values: Vec<Option<f64>> = (0..height)
        .map(|idx| match value_column.get(idx).unwrap_or(AnyValue::Null) {
            AnyValue::String(s) => parse_thousands(s),
            AnyValue::StringOwned(s) => parse_thousands(&s),
            other => any_to_f64(other),
        })
        .collect();

    let mut out = df.drop(&names[1])?;
    out.rename(&names[0], "Label".into())?;
    replace_column(&mut out, text_series("Label", labels.clone()))?;
    out.insert_column(1, Series::new("Value".into(), values))?;
    replace_column(
        &mut out,
        text_series("County", vec![Some(county); height]),
    )?;

    let keep: Vec<bool> = labels.iter().map(Option::is_some).collect();
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(out.filter(&mask)?)
}

/// Promote the first row containing `marker` to column names.
///
/// Workbook exports often carry a title block above the real header. When no
/// existing column name contains `marker` (case-insensitive), the first row
/// with a matching cell becomes the header and it and everything above it are
/// dropped. Without a matching row the table is returned unchanged.
pub fn promote_header_row(df: DataFrame, marker: &str) -> Result<DataFrame> {
    let needle = marker.to_lowercase();
    let matches = |text: &str| text.to_lowercase().contains(&needle);
    if column_names(&df).iter().any(|name| matches(name)) {
        return Ok(df);
    }

    let cells: Vec<Vec<Option<String>>> = df.get_columns().iter().map(text_values).collect();
    let header_row = (0..df.height()).find(|&row| {
        cells
            .iter()
            .any(|column| column[row].as_deref().is_some_and(matches))
    });
    let Some(header_row) = header_row else {
        debug!(marker, "no header row found");
        return Ok(df);
    };

    let names = unique_headers(
        cells
            .iter()
            .map(|column| column[header_row].clone().unwrap_or_default()),
    );
    debug!(marker, header_row, "promoting header row");
    let first_data_row = header_row + 1;
    let mut out = df.slice(first_data_row as i64, df.height() - first_data_row);
    out.set_column_names(names.iter().map(String::as_str))?;
    Ok(out)
}
