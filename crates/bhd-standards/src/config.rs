//! Pipeline configuration file.
//!
//! ```toml
//! downloads_dir = "downloads"
//! output_dir = "."
//! formats = ["csv", "parquet", "xlsx", "sqlite"]
//!
//! [outputs]
//! csv_dir = "output_csv"
//! sqlite_path = "output_data.sqlite"
//!
//! [sources]
//! hud_pit_count = "hud/pit_2024.csv"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use bhd_model::{OutputFormat, OutputLayout};

use crate::error::{Result, StandardsError};

/// Environment variable for overriding the downloads directory.
pub const DOWNLOADS_ENV_VAR: &str = "BHD_DOWNLOADS_DIR";

const DEFAULT_DOWNLOADS_DIR: &str = "downloads";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub downloads_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub formats: Option<Vec<OutputFormat>>,
    pub outputs: OutputPaths,
    /// Locator overrides keyed by dataset identifier.
    pub sources: BTreeMap<String, String>,
}

/// Artifact names, relative to the output directory unless absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputPaths {
    pub csv_dir: Option<PathBuf>,
    pub parquet_dir: Option<PathBuf>,
    pub sqlite_path: Option<PathBuf>,
    pub excel_path: Option<PathBuf>,
}

impl PipelineConfig {
    /// Read a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
        toml::from_str(&content).map_err(|source| StandardsError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Downloads directory: config, then `BHD_DOWNLOADS_DIR`, then `downloads`.
    pub fn downloads_dir(&self) -> PathBuf {
        if let Some(dir) = &self.downloads_dir {
            return dir.clone();
        }
        if let Ok(dir) = std::env::var(DOWNLOADS_ENV_VAR)
            && !dir.trim().is_empty()
        {
            return PathBuf::from(dir);
        }
        PathBuf::from(DEFAULT_DOWNLOADS_DIR)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Selected formats, all of them when unset. Duplicates are dropped.
    pub fn formats(&self) -> Vec<OutputFormat> {
        let mut formats = match &self.formats {
            Some(list) if !list.is_empty() => list.clone(),
            _ => OutputFormat::ALL.to_vec(),
        };
        formats.sort();
        formats.dedup();
        formats
    }

    /// Resolve artifact paths against `output_dir`.
    pub fn output_layout(&self, output_dir: &Path) -> OutputLayout {
        let defaults = OutputLayout::under(output_dir);
        let resolve = |custom: &Option<PathBuf>, default: PathBuf| match custom {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => output_dir.join(path),
            None => default,
        };
        OutputLayout {
            csv_dir: resolve(&self.outputs.csv_dir, defaults.csv_dir),
            parquet_dir: resolve(&self.outputs.parquet_dir, defaults.parquet_dir),
            sqlite_path: resolve(&self.outputs.sqlite_path, defaults.sqlite_path),
            excel_path: resolve(&self.outputs.excel_path, defaults.excel_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_config() {
        let config: PipelineConfig = toml::from_str(
            r#"
            downloads_dir = "/srv/downloads"
            output_dir = "/srv/out"
            formats = ["parquet", "csv", "csv"]

            [outputs]
            sqlite_path = "db/etl.sqlite"
            excel_path = "/tmp/book.xlsx"

            [sources]
            hud_pit_count = "hud/pit.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.downloads_dir(), PathBuf::from("/srv/downloads"));
        assert_eq!(
            config.formats(),
            vec![OutputFormat::Csv, OutputFormat::Parquet]
        );
        let layout = config.output_layout(&config.output_dir());
        assert_eq!(layout.csv_dir, PathBuf::from("/srv/out/output_csv"));
        assert_eq!(layout.sqlite_path, PathBuf::from("/srv/out/db/etl.sqlite"));
        assert_eq!(layout.excel_path, PathBuf::from("/tmp/book.xlsx"));
        assert_eq!(config.sources["hud_pit_count"], "hud/pit.csv");
    }

    #[test]
    fn defaults_select_every_format() {
        let config = PipelineConfig::default();
        assert_eq!(config.formats().len(), OutputFormat::ALL.len());
        assert_eq!(config.output_dir(), PathBuf::from("."));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: std::result::Result<PipelineConfig, _> = toml::from_str("download_dir = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn load_reports_toml_errors_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "formats = [\"xpt\"]").unwrap();
        let err = PipelineConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, StandardsError::Toml { .. }));

        let missing = PipelineConfig::load(Path::new("/nonexistent/bhd.toml")).unwrap_err();
        assert!(matches!(missing, StandardsError::Io { .. }));
    }
}
