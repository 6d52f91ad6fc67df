//! Locator resolution and format dispatch.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use polars::prelude::DataFrame;
use tracing::{debug, info};

use bhd_model::{DatasetDescriptor, Locator};

use crate::delimited::{DelimitedOptions, read_delimited, read_sniffed};
use crate::error::{IngestError, Result};
use crate::geojson::read_geojson;
use crate::parquet::read_parquet;
use crate::workbook::read_workbook;

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// A successfully loaded source table.
#[derive(Debug)]
pub struct LoadedTable {
    pub table: DataFrame,
    pub path: PathBuf,
    /// Source file modification time, used to stamp exported artifacts.
    pub modified: Option<SystemTime>,
}

/// Load the raw table for one dataset.
///
/// Relative local paths are resolved against `downloads_dir`. Manual,
/// restricted and remote locators never touch the filesystem or network.
pub fn load(descriptor: &DatasetDescriptor, downloads_dir: &Path) -> Result<LoadedTable> {
    let path = match descriptor.locator.resolve(downloads_dir) {
        Locator::LocalPath { path } => path,
        Locator::ManualOnly { hint } => return Err(IngestError::ManualSource { hint }),
        Locator::RestrictedOnly { note } => return Err(IngestError::RestrictedSource { note }),
        Locator::Remote { url } => return Err(IngestError::RemoteSource { url }),
    };
    if !path.is_file() {
        return Err(IngestError::FileNotFound { path });
    }

    let table = read_table(&path, descriptor)?;
    let modified = std::fs::metadata(&path)
        .and_then(|meta| meta.modified())
        .ok();
    info!(
        dataset_id = %descriptor.id,
        path = %path.display(),
        rows = table.height(),
        columns = table.width(),
        "dataset loaded"
    );
    Ok(LoadedTable {
        table,
        path,
        modified,
    })
}

/// Decode one local file according to its extension.
pub fn read_table(path: &Path, descriptor: &DatasetDescriptor) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    debug!(path = %path.display(), extension = %extension, "dispatching loader");

    match extension.as_str() {
        "csv" => read_delimited(
            path,
            DelimitedOptions {
                delimiter: b',',
                skip_rows: descriptor.skip_rows,
            },
        ),
        "txt" => read_sniffed(path, descriptor.skip_rows),
        ext if WORKBOOK_EXTENSIONS.contains(&ext) => read_workbook(path, descriptor.sheet.as_deref()),
        "geojson" => read_geojson(path),
        "rdata" | "rda" => read_rdata(path),
        "parquet" => read_parquet(path),
        _ => Err(IngestError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        }),
    }
}

#[cfg(feature = "rdata")]
fn read_rdata(path: &Path) -> Result<DataFrame> {
    crate::rdata::read_rdata(path)
}

#[cfg(not(feature = "rdata"))]
fn read_rdata(path: &Path) -> Result<DataFrame> {
    Err(IngestError::MissingFeature {
        path: path.to_path_buf(),
        feature: "rdata",
    })
}
