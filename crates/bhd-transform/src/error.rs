//! Error types for normalization and filtering.

use thiserror::Error;

/// Errors that can occur during normalization.
///
/// Bad cell values never error; they become null or stay untouched. Only
/// internal DataFrame failures surface here.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NormalizationError {
    /// Polars DataFrame operation error.
    #[error("DataFrame error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
}

/// Result type for normalization operations.
pub type Result<T> = std::result::Result<T, NormalizationError>;
