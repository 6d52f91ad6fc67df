//! Dataset pipeline with explicit stages.
//!
//! Each dataset flows through these stages in order, independently of the
//! others:
//! 1. **Load**: resolve the locator and decode the source file
//! 2. **Normalize**: apply the dataset's cleaning rules
//! 3. **Validate**: coerce declared columns, collect violations
//! 4. **Filter**: keep the county of interest plus comparison rows
//!
//! Once every dataset has been processed, the **Export** stage publishes the
//! tables in each selected format and stamps the artifacts with the newest
//! source modification time.

use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::{debug, error, info, info_span, warn};

use bhd_ingest::{FailureCategory, load};
use bhd_model::{DatasetDescriptor, LoadStatus, OutputFormat, OutputLayout};
use bhd_report::{ExportSummary, ExportTable, export_all, last_updated, stamp_last_updated};
use bhd_standards::DatasetRegistry;
use bhd_transform::{filter_rows, normalize};
use bhd_validate::{QualityReport, empty_frame, render_markdown, validate};

use crate::progress::dataset_progress;
use crate::types::{DatasetSummary, RunResult};

/// Everything a run needs, resolved from flags and configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub downloads_dir: PathBuf,
    pub output_dir: PathBuf,
    pub layout: OutputLayout,
    pub formats: Vec<OutputFormat>,
    pub quality_report: Option<PathBuf>,
    pub show_progress: bool,
}

/// A dataset after the per-dataset stages.
#[derive(Debug)]
pub struct ProcessedDataset {
    pub summary: DatasetSummary,
    pub table: DataFrame,
}

// ============================================================================
// Stages 1-4: Load, Normalize, Validate, Filter
// ============================================================================

/// Run the per-dataset stages. Never fails: an unavailable or unreadable
/// source yields an empty table with the declared columns.
pub fn process_dataset(descriptor: &DatasetDescriptor, downloads_dir: &Path) -> ProcessedDataset {
    let dataset_id = descriptor.id.as_str();
    let span = info_span!("dataset", dataset_id);
    let _guard = span.enter();
    let started = Instant::now();

    let mut summary = DatasetSummary {
        dataset_id: dataset_id.to_string(),
        description: descriptor.description.clone(),
        status: LoadStatus::Loaded,
        loaded_rows: 0,
        final_rows: 0,
        violations: 0,
        empty: false,
        issues: Vec::new(),
        outputs: Default::default(),
        modified: None,
        errors: Vec::new(),
    };

    // Stage 1: Load
    let raw = info_span!("load").in_scope(|| match load(descriptor, downloads_dir) {
        Ok(loaded) => {
            summary.modified = loaded.modified;
            Some(loaded.table)
        }
        Err(err) => {
            let reason = err.to_string();
            match err.category() {
                FailureCategory::SourceUnavailable => {
                    warn!(location = %descriptor.locator.location(), "{reason}");
                    summary.status = LoadStatus::Unavailable(reason);
                }
                FailureCategory::DecodeFailure => {
                    error!(location = %descriptor.locator.location(), "{reason}");
                    summary.status = LoadStatus::Failed(reason);
                }
            }
            None
        }
    });
    let table = raw.unwrap_or_else(|| placeholder(descriptor));
    summary.loaded_rows = table.height();

    // Stage 2: Normalize
    let table = info_span!("normalize").in_scope(|| {
        match normalize(dataset_id, table.clone()) {
            Ok(cleaned) => cleaned,
            Err(err) => {
                error!(error = %err, "normalization failed, raw table kept");
                summary.errors.push(format!("normalize: {err}"));
                table
            }
        }
    });

    // Stage 3: Validate
    let outcome = info_span!("validate").in_scope(|| validate(descriptor.schema.as_ref(), table));
    summary.violations = outcome.violation_count();
    summary.issues = outcome.issues();
    summary.empty = outcome.empty;
    if outcome.empty {
        info!(rows = 0, status = summary.status.label(), "dataset empty");
    }
    if summary.violations > 0 {
        warn!(violations = summary.violations, "schema violations");
    }
    if let Some(notes) = &descriptor.notes {
        info!(notes = %notes, "processing notes");
    }

    // Stage 4: Filter
    let validated = outcome.table;
    let table = info_span!("filter").in_scope(|| {
        match filter_rows(dataset_id, descriptor.filter.as_ref(), validated.clone()) {
            Ok(filtered) => filtered,
            Err(err) => {
                error!(error = %err, "filter failed, no rows kept");
                summary.errors.push(format!("filter: {err}"));
                validated.clear()
            }
        }
    });
    summary.final_rows = table.height();

    debug!(
        rows = summary.final_rows,
        duration_ms = started.elapsed().as_millis() as u64,
        "dataset processed"
    );
    ProcessedDataset { summary, table }
}

/// Empty stand-in for a dataset that could not be loaded.
fn placeholder(descriptor: &DatasetDescriptor) -> DataFrame {
    descriptor
        .schema
        .as_ref()
        .map_or_else(DataFrame::empty, empty_frame)
}

// ============================================================================
// Full run
// ============================================================================

/// Process every dataset in `registry`, then publish and stamp the outputs.
pub fn run_pipeline(registry: &DatasetRegistry, options: &RunOptions) -> Result<RunResult> {
    info!(
        datasets = registry.len(),
        downloads_dir = %options.downloads_dir.display(),
        output_dir = %options.output_dir.display(),
        "pipeline started"
    );
    let started = Instant::now();

    let progress = dataset_progress(registry.len() as u64, options.show_progress);
    let mut summaries = Vec::with_capacity(registry.len());
    let mut tables = Vec::with_capacity(registry.len());
    for descriptor in registry.iter() {
        progress.set_message(descriptor.id.clone());
        let processed = process_dataset(descriptor, &options.downloads_dir);
        tables.push(ExportTable::new(descriptor.id.clone(), processed.table));
        summaries.push(processed.summary);
        progress.inc(1);
    }
    progress.finish_and_clear();

    // Stage 5: Export
    let export = export_all(&options.layout, &options.formats, &tables);
    for summary in &mut summaries {
        summary.outputs = export.outputs_for(&summary.dataset_id);
    }
    let newest = stamp_outputs(&export, summaries.iter().map(|s| s.modified));

    // Optional quality report; a write failure is recorded, not propagated.
    let mut quality_report = None;
    let mut quality_report_error = None;
    if let Some(path) = &options.quality_report {
        match write_quality_report(path, &tables) {
            Ok(written) => quality_report = Some(written),
            Err(err) => {
                let message = format!("{err:#}");
                warn!(path = %path.display(), error = %message, "quality report not written");
                quality_report_error = Some(message);
            }
        }
    }

    info!(
        loaded = summaries
            .iter()
            .filter(|s| s.status == LoadStatus::Loaded)
            .count(),
        total = summaries.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "pipeline finished"
    );
    Ok(RunResult {
        output_dir: options.output_dir.clone(),
        datasets: summaries,
        export,
        last_updated: newest,
        quality_report,
        quality_report_error,
    })
}

fn stamp_outputs<I>(export: &ExportSummary, times: I) -> Option<SystemTime>
where
    I: IntoIterator<Item = Option<SystemTime>>,
{
    let Some(newest) = last_updated(times) else {
        debug!("no source modification time, outputs left unstamped");
        return None;
    };
    stamp_last_updated(&export.stamp_targets(), newest);
    Some(newest)
}

fn write_quality_report(path: &Path, tables: &[ExportTable]) -> Result<PathBuf> {
    let reports: Vec<QualityReport> = tables
        .iter()
        .map(|t| QualityReport::build(&t.dataset_id, &t.table))
        .collect();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    std::fs::write(path, render_markdown(&reports))
        .with_context(|| format!("write quality report {}", path.display()))?;
    info!(path = %path.display(), "quality report written");
    Ok(path.to_path_buf())
}
