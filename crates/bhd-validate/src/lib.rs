//! Schema validation and data quality reporting.
//!
//! [`validate`] coerces each declared column to its logical type and records
//! a [`Violation`](bhd_model::Violation) for every cell it had to reject.
//! Validation never fails: a dataset with problems still flows on to export,
//! and the violations are reported alongside it.

mod coerce;
mod quality;
mod validator;

// === Coercion ===
pub use coerce::{coerce_column, logical_dtype};

// === Validation ===
pub use validator::{ValidationOutcome, empty_frame, validate};

// === Quality report ===
pub use quality::{ColumnQuality, QualityReport, render_markdown};
