//! CLI library components for the dashboard ETL.

pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod types;
