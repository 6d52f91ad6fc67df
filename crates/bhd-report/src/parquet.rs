//! One Parquet file per dataset.

use std::fs::File;
use std::path::Path;

use polars::prelude::ParquetWriter;
use tracing::{debug, warn};

use bhd_model::OutputFormat;

use crate::common::{create_dir, dataset_file};
use crate::error::{ExportError, Result};
use crate::types::{Artifact, ExportTable, FormatReport};

/// Write `<dir>/<dataset_id>.parquet` for every table, empty ones included.
pub fn write_parquet_outputs(dir: &Path, tables: &[ExportTable]) -> FormatReport {
    let mut report = FormatReport::new(OutputFormat::Parquet, dir);
    if let Err(err) = create_dir(dir) {
        report.fail_all(tables, &err.to_string());
        return report;
    }
    for table in tables {
        let path = dataset_file(dir, &table.dataset_id, "parquet");
        match write_parquet(&path, table) {
            Ok(bytes) => {
                debug!(dataset_id = %table.dataset_id, bytes, "parquet written");
                report.written.push((table.dataset_id.clone(), Artifact::File(path)));
            }
            Err(err) => {
                warn!(dataset_id = %table.dataset_id, error = %err, "parquet export failed");
                report.fail_dataset(&table.dataset_id, err.to_string());
            }
        }
    }
    report
}

fn write_parquet(path: &Path, table: &ExportTable) -> Result<u64> {
    let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut df = table.table.clone();
    Ok(ParquetWriter::new(file).finish(&mut df)?)
}
