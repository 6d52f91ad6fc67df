//! Cell coercion to declared logical types.

use chrono::NaiveDate;
use polars::prelude::{AnyValue, Column, DataType, NamedFrom, PolarsResult, Series, TimeUnit};

use bhd_common::{
    any_is_null, any_to_f64, any_to_i64, any_to_string, date_series, days_to_date, parse_date,
    text_series,
};
use bhd_model::{ColumnSpec, LogicalType, Violation, ViolationKind};

/// Polars type used to store a logical type.
pub fn logical_dtype(logical_type: LogicalType) -> DataType {
    match logical_type {
        LogicalType::Text => DataType::String,
        LogicalType::Integer => DataType::Int64,
        LogicalType::Real => DataType::Float64,
        LogicalType::Date => DataType::Date,
    }
}

/// Coerce every cell of `column` to `spec`'s type.
///
/// Returns the coerced column and the violations found, in row order.
pub fn coerce_column(spec: &ColumnSpec, column: &Column) -> PolarsResult<(Series, Vec<Violation>)> {
    let name = spec.name.as_str();
    let mut violations = Vec::new();
    let mut reject = |row_index: usize, value: &AnyValue<'_>| {
        violations.push(Violation {
            column: spec.name.clone(),
            row_index,
            kind: ViolationKind::TypeMismatch,
            value: Some(any_to_string(value.clone())),
        });
    };

    let series = match spec.logical_type {
        LogicalType::Text => {
            let values: Vec<Option<String>> = cells(column)
                .map(|(_, value)| (!any_is_null(&value)).then(|| any_to_string(value)))
                .collect();
            text_series(name, values)
        }
        LogicalType::Integer => {
            let values: Vec<Option<i64>> = cells(column)
                .map(|(idx, value)| {
                    if any_is_null(&value) {
                        return None;
                    }
                    let coerced = any_to_i64(value.clone());
                    if coerced.is_none() {
                        reject(idx, &value);
                    }
                    coerced
                })
                .collect();
            Series::new(name.into(), values)
        }
        LogicalType::Real => {
            let values: Vec<Option<f64>> = cells(column)
                .map(|(idx, value)| {
                    if any_is_null(&value) {
                        return None;
                    }
                    let coerced = match &value {
                        AnyValue::Boolean(_) => None,
                        _ => any_to_f64(value.clone()),
                    };
                    if coerced.is_none() {
                        reject(idx, &value);
                    }
                    coerced
                })
                .collect();
            Series::new(name.into(), values)
        }
        LogicalType::Date => {
            let values: Vec<Option<NaiveDate>> = cells(column)
                .map(|(idx, value)| {
                    if any_is_null(&value) {
                        return None;
                    }
                    let coerced = any_to_date(&value);
                    if coerced.is_none() {
                        reject(idx, &value);
                    }
                    coerced
                })
                .collect();
            date_series(name, &values)?
        }
    };

    if !spec.nullable {
        for (row_index, value) in (0..series.len()).map(|idx| (idx, series.get(idx))) {
            if matches!(value, Ok(AnyValue::Null)) {
                violations.push(Violation {
                    column: spec.name.clone(),
                    row_index,
                    kind: ViolationKind::UnexpectedNull,
                    value: None,
                });
            }
        }
        // Keep (row, kind) order within the column.
        violations.sort_by_key(|v| (v.row_index, v.kind));
    }

    Ok((series, violations))
}

fn cells(column: &Column) -> impl Iterator<Item = (usize, AnyValue<'_>)> {
    (0..column.len()).map(move |idx| (idx, column.get(idx).unwrap_or(AnyValue::Null)))
}

fn any_to_date(value: &AnyValue<'_>) -> Option<NaiveDate> {
    match value {
        AnyValue::Date(days) => days_to_date(*days),
        AnyValue::Datetime(ts, unit, _) => {
            let per_day: i64 = match unit {
                TimeUnit::Nanoseconds => 86_400_000_000_000,
                TimeUnit::Microseconds => 86_400_000_000,
                TimeUnit::Milliseconds => 86_400_000,
            };
            i32::try_from(ts.div_euclid(per_day))
                .ok()
                .and_then(days_to_date)
        }
        AnyValue::String(s) => parse_date(s),
        AnyValue::StringOwned(s) => parse_date(s),
        _ => None,
    }
}
