//! Publication of every selected format.

use std::time::Instant;

use tracing::{error, info, info_span};

use bhd_model::{OutputFormat, OutputLayout};

use crate::csv::write_csv_outputs;
use crate::parquet::write_parquet_outputs;
use crate::sqlite::write_sqlite;
use crate::types::{ExportSummary, ExportTable, FormatReport};
use crate::xlsx::write_xlsx;

/// Write `tables` in each format. A failing format never stops the others.
pub fn export_all(
    layout: &OutputLayout,
    formats: &[OutputFormat],
    tables: &[ExportTable],
) -> ExportSummary {
    let mut summary = ExportSummary::default();
    for &format in formats {
        let span = info_span!("export", format = format.as_str());
        let _guard = span.enter();
        let started = Instant::now();
        let report = write_format(layout, format, tables);
        log_report(&report, started);
        summary.reports.push(report);
    }
    summary
}

pub fn write_format(
    layout: &OutputLayout,
    format: OutputFormat,
    tables: &[ExportTable],
) -> FormatReport {
    match format {
        OutputFormat::Csv => write_csv_outputs(&layout.csv_dir, tables),
        OutputFormat::Parquet => write_parquet_outputs(&layout.parquet_dir, tables),
        OutputFormat::Sqlite => write_sqlite(&layout.sqlite_path, tables),
        OutputFormat::Xlsx => write_xlsx(&layout.excel_path, tables),
    }
}

fn log_report(report: &FormatReport, started: Instant) {
    let duration_ms = started.elapsed().as_millis() as u64;
    if let Some(message) = &report.error {
        error!(
            path = %report.location.display(),
            duration_ms,
            error = %message,
            "export failed"
        );
        return;
    }
    info!(
        path = %report.location.display(),
        written = report.written.len(),
        failed = report.failures.len(),
        duration_ms,
        "export complete"
    );
}
