//! DataFrame column helpers shared by the loader, normalizer and validator.

use std::collections::HashMap;

use chrono::NaiveDate;
use polars::prelude::{
    AnyValue, Column, DataFrame, DataType, IntoColumn, NamedFrom, PolarsResult, Series,
};

use crate::dates::date_to_days;
use crate::polars::{any_is_null, any_to_string};

/// Column names in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|n| n.as_str() == name)
}

/// Text rendering of every cell in a column, `None` for nulls and NaN.
pub fn text_values(column: &Column) -> Vec<Option<String>> {
    (0..column.len())
        .map(|idx| {
            let value = column.get(idx).unwrap_or(AnyValue::Null);
            if any_is_null(&value) {
                None
            } else {
                Some(any_to_string(value))
            }
        })
        .collect()
}

pub fn text_series(name: &str, values: Vec<Option<String>>) -> Series {
    Series::new(name.into(), values)
}

/// Build a polars `Date` column from calendar dates.
pub fn date_series(name: &str, values: &[Option<NaiveDate>]) -> PolarsResult<Series> {
    let days: Vec<Option<i32>> = values.iter().map(|v| v.map(date_to_days)).collect();
    Series::new(name.into(), days).cast(&DataType::Date)
}

/// An all-null column of the given type.
pub fn null_series(name: &str, dtype: &DataType, len: usize) -> Series {
    Series::full_null(name.into(), len, dtype)
}

/// Make raw header cells usable as column names.
///
/// Blank headers become `Unnamed: {index}`; repeated names get a `.{n}`
/// suffix in order of appearance (`Rate`, `Rate.1`, `Rate.2`).
pub fn unique_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();
    for (idx, header) in raw.into_iter().enumerate() {
        let header = header.as_ref().trim_start_matches('\u{feff}');
        let base = if header.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            header.to_string()
        };
        let mut name = base.clone();
        while let Some(count) = seen.get_mut(&name) {
            *count += 1;
            name = format!("{base}.{count}");
        }
        seen.insert(name.clone(), 0);
        names.push(name);
    }
    names
}

/// Insert `series` into `df`, replacing any column with the same name in place.
pub fn replace_column(df: &mut DataFrame, series: Series) -> PolarsResult<()> {
    df.with_column(series.into_column())?;
    Ok(())
}
