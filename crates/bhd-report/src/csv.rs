//! One CSV file per dataset.

use std::fs::File;
use std::path::Path;

use polars::prelude::{CsvWriter, SerWriter};
use tracing::{debug, warn};

use bhd_model::OutputFormat;

use crate::common::{create_dir, dataset_file};
use crate::error::{ExportError, Result};
use crate::types::{Artifact, ExportTable, FormatReport};

/// Write `<dir>/<dataset_id>.csv` for every table, header always included.
pub fn write_csv_outputs(dir: &Path, tables: &[ExportTable]) -> FormatReport {
    let mut report = FormatReport::new(OutputFormat::Csv, dir);
    if let Err(err) = create_dir(dir) {
        report.fail_all(tables, &err.to_string());
        return report;
    }
    for table in tables {
        let path = dataset_file(dir, &table.dataset_id, "csv");
        match write_csv(&path, table) {
            Ok(()) => {
                debug!(dataset_id = %table.dataset_id, path = %path.display(), "csv written");
                report.written.push((table.dataset_id.clone(), Artifact::File(path)));
            }
            Err(err) => {
                warn!(dataset_id = %table.dataset_id, error = %err, "csv export failed");
                report.fail_dataset(&table.dataset_id, err.to_string());
            }
        }
    }
    report
}

fn write_csv(path: &Path, table: &ExportTable) -> Result<()> {
    let mut file = File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut df = table.table.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    Ok(())
}
