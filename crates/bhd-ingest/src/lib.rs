//! Dataset loading for the dashboard ETL.
//!
//! Resolves a dataset's locator and decodes the file into a Polars DataFrame.
//!
//! # Supported formats
//!
//! - **Delimited text**: `.csv` (comma) and `.txt` (sniffed delimiter), read as text
//! - **Workbooks**: `.xlsx`, `.xlsm`, `.xls`, `.xlsb`, `.ods` via calamine
//! - **GeoJSON**: FeatureCollection properties plus flattened geometry
//! - **R workspaces**: `.RData`/`.rda`, behind the default `rdata` feature
//! - **Parquet**
//!
//! Manual, restricted and remote locators fail with a
//! [`FailureCategory::SourceUnavailable`] error; nothing is ever downloaded.

mod delimited;
mod error;
mod geojson;
mod loader;
mod parquet;
#[cfg(feature = "rdata")]
mod rdata;
mod workbook;

// === Error Types ===
pub use error::{FailureCategory, IngestError, Result};

// === Loading ===
pub use loader::{LoadedTable, load, read_table};

// === Format Readers ===
pub use delimited::{DelimitedOptions, read_delimited, read_sniffed, sniff_delimiter};
pub use geojson::read_geojson;
pub use parquet::read_parquet;
#[cfg(feature = "rdata")]
pub use rdata::read_rdata;
pub use workbook::read_workbook;
