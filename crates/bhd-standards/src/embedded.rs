//! Embedded registry data.
//!
//! Every registry table is embedded at compile time using `include_str!()`,
//! so the binary runs without locating data files on disk.

/// Dataset identifiers, locators and loader hints.
pub const SOURCES: &str = include_str!("../data/sources.csv");

/// Per-dataset column declarations.
pub const SCHEMAS: &str = include_str!("../data/schemas.csv");

/// Jurisdiction filters (`|` separates accepted values).
pub const FILTERS: &str = include_str!("../data/filters.csv");
