use std::path::PathBuf;
use std::time::SystemTime;

use bhd_model::{DatasetOutputs, LoadStatus, ValidationIssue};
use bhd_report::ExportSummary;

/// What happened to one dataset during a run.
#[derive(Debug, Clone)]
pub struct DatasetSummary {
    pub dataset_id: String,
    pub description: String,
    pub status: LoadStatus,
    pub loaded_rows: usize,
    pub final_rows: usize,
    pub violations: usize,
    /// No rows survived loading and validation; not a failure by itself.
    pub empty: bool,
    pub issues: Vec<ValidationIssue>,
    pub outputs: DatasetOutputs,
    /// Source file modification time.
    pub modified: Option<SystemTime>,
    /// Internal stage failures (normalize, filter).
    pub errors: Vec<String>,
}

#[derive(Debug)]
pub struct RunResult {
    pub output_dir: PathBuf,
    pub datasets: Vec<DatasetSummary>,
    pub export: ExportSummary,
    pub last_updated: Option<SystemTime>,
    pub quality_report: Option<PathBuf>,
    /// Why the requested quality report could not be written.
    pub quality_report_error: Option<String>,
}

impl RunResult {
    /// Exit status of the run: success iff every primary format wrote every dataset.
    pub fn is_success(&self) -> bool {
        self.export.primary_ok()
    }

    pub fn loaded_count(&self) -> usize {
        self.datasets
            .iter()
            .filter(|d| d.status == LoadStatus::Loaded)
            .count()
    }
}
