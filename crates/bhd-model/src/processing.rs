use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Published interchange formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Parquet,
    Xlsx,
    Sqlite,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::Csv, Self::Parquet, Self::Xlsx, Self::Sqlite];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
            Self::Xlsx => "xlsx",
            Self::Sqlite => "sqlite",
        }
    }

    /// Directory-per-dataset formats whose failures decide the exit status.
    pub fn is_primary(self) -> bool {
        matches!(self, Self::Csv | Self::Parquet)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            "sqlite" | "db" => Ok(Self::Sqlite),
            other => Err(ModelError::UnknownOutputFormat(other.to_string())),
        }
    }
}

/// Outcome of the load stage for one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum LoadStatus {
    Loaded,
    /// Manual, restricted, remote or missing source.
    Unavailable(String),
    /// The source exists but could not be decoded.
    Failed(String),
}

impl LoadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Unavailable(_) => "unavailable",
            Self::Failed(_) => "failed",
        }
    }
}

/// Resolved artifact locations for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLayout {
    pub csv_dir: PathBuf,
    pub parquet_dir: PathBuf,
    pub sqlite_path: PathBuf,
    pub excel_path: PathBuf,
}

impl OutputLayout {
    /// The conventional file names under `root`.
    pub fn under(root: &std::path::Path) -> Self {
        Self {
            csv_dir: root.join("output_csv"),
            parquet_dir: root.join("output_parquet"),
            sqlite_path: root.join("output_data.sqlite"),
            excel_path: root.join("behavioral_health_dashboard_data.xlsx"),
        }
    }
}

/// Artifacts written for one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetOutputs {
    pub csv: Option<PathBuf>,
    pub parquet: Option<PathBuf>,
    pub sqlite_table: Option<String>,
    pub xlsx_sheet: Option<String>,
}

impl DatasetOutputs {
    pub fn has(&self, format: OutputFormat) -> bool {
        match format {
            OutputFormat::Csv => self.csv.is_some(),
            OutputFormat::Parquet => self.parquet.is_some(),
            OutputFormat::Sqlite => self.sqlite_table.is_some(),
            OutputFormat::Xlsx => self.xlsx_sheet.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parses_aliases() {
        assert_eq!("Excel".parse::<OutputFormat>(), Ok(OutputFormat::Xlsx));
        assert_eq!("db".parse::<OutputFormat>(), Ok(OutputFormat::Sqlite));
        assert!("xpt".parse::<OutputFormat>().is_err());
        assert!(OutputFormat::Parquet.is_primary());
        assert!(!OutputFormat::Sqlite.is_primary());
    }

    #[test]
    fn outputs_track_formats() {
        let outputs = DatasetOutputs {
            csv: Some(PathBuf::from("output_csv/mat_annual.csv")),
            sqlite_table: Some("mat_annual".to_string()),
            ..DatasetOutputs::default()
        };
        assert!(outputs.has(OutputFormat::Csv));
        assert!(!outputs.has(OutputFormat::Parquet));
        assert!(outputs.has(OutputFormat::Sqlite));
    }
}
