//! Shared utilities for the dashboard ETL crates.
//!
//! This crate provides the small helpers every stage needs: `AnyValue`
//! conversions, calendar date parsing, and DataFrame column builders.

pub mod dates;
pub mod frame;
pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use dates::{date_to_days, days_to_date, parse_date};
pub use frame::{
    column_names, date_series, has_column, null_series, replace_column, text_series, text_values,
    unique_headers,
};
pub use polars::{
    any_is_null, any_to_f64, any_to_i64, any_to_string, any_to_string_non_empty, format_numeric,
    parse_f64, parse_i64, parse_whole_f64,
};
