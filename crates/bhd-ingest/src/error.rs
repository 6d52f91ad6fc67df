//! Error types for dataset loading.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Whether a failed load means "no data to read" or "data we could not read".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// Manual, restricted, remote or missing source.
    SourceUnavailable,
    /// The bytes exist but could not be decoded into a table.
    DecodeFailure,
}

/// Errors that can occur while loading a dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Unavailable Sources ===
    #[error("manual download required: {hint}")]
    ManualSource { hint: String },

    #[error("restricted source: {note}")]
    RestrictedSource { note: String },

    #[error("remote fetch is not supported: {url}")]
    RemoteSource { url: String },

    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Decoding Errors ===
    #[error("unsupported file format '{extension}': {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("failed to parse delimited text {path}: {message}")]
    Delimited { path: PathBuf, message: String },

    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("sheet '{sheet}' not found in {path}")]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("invalid GeoJSON {path}: {message}")]
    GeoJson { path: PathBuf, message: String },

    #[error("invalid R data file {path}: {message}")]
    RData { path: PathBuf, message: String },

    #[error("cannot decode {path}: missing optional dependency (enable the `{feature}` feature)")]
    MissingFeature { path: PathBuf, feature: &'static str },

    #[error("failed to read Parquet {path}: {message}")]
    Parquet { path: PathBuf, message: String },

    #[error("DataFrame operation failed: {0}")]
    DataFrame(#[from] PolarsError),
}

impl IngestError {
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::ManualSource { .. }
            | Self::RestrictedSource { .. }
            | Self::RemoteSource { .. }
            | Self::FileNotFound { .. }
            | Self::FileRead { .. } => FailureCategory::SourceUnavailable,
            _ => FailureCategory::DecodeFailure,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.category() == FailureCategory::SourceUnavailable
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
