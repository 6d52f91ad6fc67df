//! Publication of dashboard datasets.
//!
//! Each dataset is written to every selected format:
//!
//! - **CSV**: one file per dataset under the CSV directory
//! - **Parquet**: one file per dataset under the Parquet directory
//! - **SQLite**: one table per dataset in a database recreated each run
//! - **XLSX**: one sheet per dataset in a single workbook
//!
//! Formats are isolated from each other, and within a directory format a
//! failing dataset is recorded without stopping the rest.

mod common;
mod csv;
mod error;
mod export;
mod parquet;
mod sqlite;
mod stamp;
mod types;
mod xlsx;

pub use csv::write_csv_outputs;
pub use error::{ExportError, Result};
pub use export::{export_all, write_format};
pub use parquet::write_parquet_outputs;
pub use sqlite::{PLACEHOLDER_COLUMN, write_sqlite};
pub use stamp::{last_updated, stamp_last_updated};
pub use types::{Artifact, DatasetFailure, ExportSummary, ExportTable, FormatReport};
pub use xlsx::{MAX_CELL_CHARS, MAX_SHEET_NAME, clean_text, sheet_name, write_xlsx};
