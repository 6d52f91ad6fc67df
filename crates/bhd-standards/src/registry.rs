//! The combined dataset registry.

use std::collections::BTreeMap;

use tracing::debug;

use bhd_model::{DatasetDescriptor, Locator};

use crate::error::{Result, StandardsError};
use crate::filters::load_filters;
use crate::schemas::SchemaRegistry;
use crate::sources::load_sources;

/// Every known dataset, in registry order.
///
/// Built once at startup and never mutated afterwards; stages receive
/// descriptors by reference.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    datasets: Vec<DatasetDescriptor>,
}

impl DatasetRegistry {
    /// Join the embedded source, schema and filter tables.
    pub fn embedded() -> Result<Self> {
        let sources = load_sources()?;
        let schemas = SchemaRegistry::embedded()?;
        let mut filters = load_filters()?;

        let datasets = sources
            .into_iter()
            .map(|source| {
                let mut descriptor = DatasetDescriptor::new(source.id, source.locator);
                descriptor.description = source.description;
                descriptor.sheet = source.sheet;
                descriptor.skip_rows = source.skip_rows;
                descriptor.notes = source.notes;
                descriptor.schema = schemas.get(&descriptor.id).cloned();
                descriptor.filter = filters.remove(&descriptor.id);
                descriptor
            })
            .collect::<Vec<_>>();

        if let Some(id) = filters.into_keys().next() {
            return Err(StandardsError::UnknownDataset { id });
        }
        debug!(dataset_count = datasets.len(), "dataset registry loaded");
        Ok(Self { datasets })
    }

    pub fn from_descriptors(datasets: Vec<DatasetDescriptor>) -> Self {
        Self { datasets }
    }

    /// Replace locators from configuration. Unknown identifiers are an error.
    pub fn with_locator_overrides(mut self, overrides: &BTreeMap<String, String>) -> Result<Self> {
        for (id, raw) in overrides {
            let descriptor = self
                .datasets
                .iter_mut()
                .find(|d| &d.id == id)
                .ok_or_else(|| StandardsError::UnknownDataset { id: id.clone() })?;
            descriptor.locator = Locator::parse(raw);
            debug!(dataset_id = %id, locator = %descriptor.locator, "locator overridden");
        }
        Ok(self)
    }

    /// Keep only the named datasets, preserving registry order.
    pub fn select(mut self, ids: &[String]) -> Result<Self> {
        if let Some(unknown) = ids.iter().find(|id| self.get(id).is_none()) {
            return Err(StandardsError::UnknownDataset {
                id: unknown.clone(),
            });
        }
        if !ids.is_empty() {
            self.datasets.retain(|d| ids.contains(&d.id));
        }
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&DatasetDescriptor> {
        self.datasets.iter().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetDescriptor> {
        self.datasets.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl IntoIterator for DatasetRegistry {
    type Item = DatasetDescriptor;
    type IntoIter = std::vec::IntoIter<DatasetDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.datasets.into_iter()
    }
}
