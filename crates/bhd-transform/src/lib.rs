//! Normalization and filtering for dashboard datasets.
//!
//! Cleaning is expressed as data: a [`RuleRegistry`] maps each dataset id to
//! an ordered [`DatasetPipeline`] of [`RuleKind`]s, and the executor applies
//! them to a Polars DataFrame.
//!
//! # Example
//!
//! ```ignore
//! use bhd_transform::{filter_rows, normalize};
//!
//! let cleaned = normalize("mat_annual", raw)?;
//! let county_only = filter_rows("mat_annual", descriptor.filter.as_ref(), cleaned)?;
//! ```
//!
//! Every standard rule is idempotent, so normalizing an already clean table
//! leaves it unchanged.

mod error;
mod executor;
mod filter;
mod registry;
mod reshape;
mod types;

pub mod normalization;

// Core types
pub use types::{DatasetPipeline, NormalizationRule, RuleKind, RuleStage};

// Error type
pub use error::{NormalizationError, Result};

// Pipeline building
pub use registry::{RuleRegistry, normalize, standard_pipeline};

// Execution
pub use executor::{apply_rule, execute_pipeline};
pub use reshape::{promote_header_row, reshape_label_value};

// Filtering
pub use filter::filter_rows;
