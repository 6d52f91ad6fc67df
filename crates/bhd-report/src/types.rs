//! Export inputs and per-format results.

use std::path::PathBuf;

use polars::prelude::DataFrame;

use bhd_model::{DatasetOutputs, OutputFormat};

/// A validated, filtered table ready for publication.
#[derive(Debug, Clone)]
pub struct ExportTable {
    pub dataset_id: String,
    pub table: DataFrame,
}

impl ExportTable {
    pub fn new(dataset_id: impl Into<String>, table: DataFrame) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            table,
        }
    }
}

/// Where one dataset landed within a format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    File(PathBuf),
    Table(String),
    Sheet(String),
}

impl Artifact {
    pub fn label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Table(name) | Self::Sheet(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFailure {
    pub dataset_id: String,
    pub message: String,
}

/// Result of writing one format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatReport {
    pub format: OutputFormat,
    /// The format's file or directory.
    pub location: PathBuf,
    pub written: Vec<(String, Artifact)>,
    pub failures: Vec<DatasetFailure>,
    /// Failure of the format as a whole (directory, database or workbook).
    pub error: Option<String>,
}

impl FormatReport {
    pub fn new(format: OutputFormat, location: impl Into<PathBuf>) -> Self {
        Self {
            format,
            location: location.into(),
            written: Vec::new(),
            failures: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failures.is_empty()
    }

    pub(crate) fn fail_dataset(&mut self, dataset_id: &str, message: impl Into<String>) {
        self.failures.push(DatasetFailure {
            dataset_id: dataset_id.to_string(),
            message: message.into(),
        });
    }

    /// Mark everything as failed after a format-wide error.
    pub(crate) fn fail_all(&mut self, tables: &[ExportTable], message: &str) {
        self.written.clear();
        self.error = Some(message.to_string());
        for table in tables {
            self.fail_dataset(&table.dataset_id, message);
        }
    }
}

/// Results of every selected format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub reports: Vec<FormatReport>,
}

impl ExportSummary {
    /// True when every selected primary format (CSV, Parquet) wrote every dataset.
    pub fn primary_ok(&self) -> bool {
        self.reports
            .iter()
            .filter(|r| r.format.is_primary())
            .all(FormatReport::is_success)
    }

    /// Artifacts recorded for one dataset across formats.
    pub fn outputs_for(&self, dataset_id: &str) -> DatasetOutputs {
        let mut outputs = DatasetOutputs::default();
        for report in &self.reports {
            let Some((_, artifact)) = report.written.iter().find(|(id, _)| id == dataset_id)
            else {
                continue;
            };
            match (report.format, artifact) {
                (OutputFormat::Csv, Artifact::File(path)) => outputs.csv = Some(path.clone()),
                (OutputFormat::Parquet, Artifact::File(path)) => {
                    outputs.parquet = Some(path.clone());
                }
                (OutputFormat::Sqlite, Artifact::Table(name)) => {
                    outputs.sqlite_table = Some(name.clone());
                }
                (OutputFormat::Xlsx, Artifact::Sheet(name)) => {
                    outputs.xlsx_sheet = Some(name.clone());
                }
                _ => {}
            }
        }
        outputs
    }

    /// Files and directories to stamp with the last-updated time.
    pub fn stamp_targets(&self) -> Vec<PathBuf> {
        let mut targets = Vec::new();
        for report in self.reports.iter().filter(|r| r.error.is_none()) {
            for (_, artifact) in &report.written {
                if let Artifact::File(path) = artifact {
                    targets.push(path.clone());
                }
            }
            if !report.written.is_empty() || report.format.is_primary() {
                targets.push(report.location.clone());
            }
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_status_ignores_secondary_formats() {
        let mut csv = FormatReport::new(OutputFormat::Csv, "out/csv");
        csv.written.push((
            "mat_annual".to_string(),
            Artifact::File(PathBuf::from("out/csv/mat_annual.csv")),
        ));
        let mut sqlite = FormatReport::new(OutputFormat::Sqlite, "out/db.sqlite");
        sqlite.error = Some("disk full".to_string());

        let summary = ExportSummary {
            reports: vec![csv, sqlite],
        };
        assert!(summary.primary_ok());
        let outputs = summary.outputs_for("mat_annual");
        assert!(outputs.has(OutputFormat::Csv));
        assert!(!outputs.has(OutputFormat::Sqlite));
        assert_eq!(
            summary.stamp_targets(),
            vec![
                PathBuf::from("out/csv/mat_annual.csv"),
                PathBuf::from("out/csv")
            ]
        );
    }

    #[test]
    fn dataset_failure_fails_primary() {
        let mut parquet = FormatReport::new(OutputFormat::Parquet, "out/parquet");
        parquet.fail_dataset("nsduh", "boom");
        let summary = ExportSummary {
            reports: vec![parquet],
        };
        assert!(!summary.primary_ok());
    }
}
