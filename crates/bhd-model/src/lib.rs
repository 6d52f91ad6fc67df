pub mod dataset;
pub mod error;
pub mod locator;
pub mod processing;
pub mod schema;
pub mod validation;

pub use dataset::{DatasetDescriptor, FilterSpec};
pub use error::{ModelError, Result};
pub use locator::Locator;
pub use processing::{DatasetOutputs, LoadStatus, OutputFormat, OutputLayout};
pub use schema::{ColumnSpec, LogicalType, Schema};
pub use validation::{IssueSeverity, ValidationIssue, Violation, ViolationKind};
