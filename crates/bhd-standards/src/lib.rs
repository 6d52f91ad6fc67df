#![deny(unsafe_code)]

//! Registries of dataset sources, schemas and jurisdiction filters.
//!
//! The registries are compiled into the binary from `data/*.csv` and combined
//! into [`DatasetRegistry`], the immutable description of every dataset the
//! pipeline knows about. [`PipelineConfig`] layers run-time overrides on top.

pub mod config;
pub mod embedded;
pub mod error;
pub mod filters;
pub mod registry;
pub mod schemas;
pub mod sources;

pub use crate::config::{DOWNLOADS_ENV_VAR, OutputPaths, PipelineConfig};
pub use crate::error::{Result, StandardsError};
pub use crate::filters::load_filters;
pub use crate::registry::DatasetRegistry;
pub use crate::schemas::SchemaRegistry;
pub use crate::sources::{SourceEntry, load_sources};
