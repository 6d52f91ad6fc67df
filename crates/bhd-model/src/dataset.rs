use serde::{Deserialize, Serialize};

use crate::locator::Locator;
use crate::schema::Schema;

/// Restriction of a dataset to the target county plus comparison rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub column: String,
    pub accepted: Vec<String>,
}

impl FilterSpec {
    pub fn new(column: impl Into<String>, accepted: &[&str]) -> Self {
        Self {
            column: column.into(),
            accepted: accepted.iter().map(|v| (*v).to_string()).collect(),
        }
    }

    /// Exact, case-sensitive membership.
    pub fn accepts(&self, value: &str) -> bool {
        self.accepted.iter().any(|v| v == value)
    }
}

/// Static description of one dataset, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub id: String,
    pub locator: Locator,
    pub description: String,
    /// Workbook sheet to read; the first sheet when absent.
    pub sheet: Option<String>,
    /// Leading title records to skip in delimited text.
    pub skip_rows: usize,
    pub notes: Option<String>,
    pub schema: Option<Schema>,
    pub filter: Option<FilterSpec>,
}

impl DatasetDescriptor {
    pub fn new(id: impl Into<String>, locator: Locator) -> Self {
        Self {
            id: id.into(),
            locator,
            description: String::new(),
            sheet: None,
            skip_rows: 0,
            notes: None,
            schema: None,
            filter: None,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    #[must_use]
    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }
}
