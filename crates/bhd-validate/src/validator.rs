//! Schema validation: coerce declared columns and collect violations.

use std::collections::BTreeSet;

use polars::prelude::{DataFrame, IntoColumn, Series};
use tracing::{debug, warn};

use bhd_common::{has_column, replace_column};
use bhd_model::{Schema, ValidationIssue, Violation};

use crate::coerce::{coerce_column, logical_dtype};

/// Maximum distinct sample values kept per issue.
const MAX_SAMPLES: usize = 5;

/// Result of validating one table.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// The table with declared columns coerced to their logical types.
    pub table: DataFrame,
    /// Offending cells, in schema column order then row order.
    pub violations: Vec<Violation>,
    /// True when the table has no rows.
    pub empty: bool,
}

impl ValidationOutcome {
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Aggregate violations per (column, kind), in order of first appearance.
    pub fn issues(&self) -> Vec<ValidationIssue> {
        let mut issues: Vec<ValidationIssue> = Vec::new();
        let mut seen_samples: Vec<BTreeSet<String>> = Vec::new();

        for violation in &self.violations {
            let idx = match issues
                .iter()
                .position(|i| i.column == violation.column && i.kind == violation.kind)
            {
                Some(idx) => idx,
                None => {
                    issues.push(ValidationIssue {
                        column: violation.column.clone(),
                        kind: violation.kind,
                        severity: violation.kind.severity(),
                        count: 0,
                        samples: Vec::new(),
                    });
                    seen_samples.push(BTreeSet::new());
                    issues.len() - 1
                }
            };
            let issue = &mut issues[idx];
            issue.count += 1;
            if let Some(value) = &violation.value
                && issue.samples.len() < MAX_SAMPLES
                && seen_samples[idx].insert(value.clone())
            {
                issue.samples.push(value.clone());
            }
        }
        issues
    }
}

/// Validate `df` against `schema`.
///
/// Never fails: without a schema the table comes back unchanged, and a column
/// that cannot be rebuilt is left as loaded with a warning.
pub fn validate(schema: Option<&Schema>, df: DataFrame) -> ValidationOutcome {
    let empty = df.height() == 0;
    let Some(schema) = schema else {
        return ValidationOutcome {
            table: df,
            violations: Vec::new(),
            empty,
        };
    };

    let mut table = df;
    let mut violations = Vec::new();
    for spec in &schema.columns {
        if !has_column(&table, &spec.name) {
            continue;
        }
        let coerced = table
            .column(&spec.name)
            .and_then(|column| coerce_column(spec, column));
        let (series, found) = match coerced {
            Ok(result) => result,
            Err(err) => {
                warn!(column = %spec.name, error = %err, "column left uncoerced");
                continue;
            }
        };
        if let Err(err) = replace_column(&mut table, series) {
            warn!(column = %spec.name, error = %err, "column left uncoerced");
            continue;
        }
        if !found.is_empty() {
            debug!(column = %spec.name, violations = found.len(), "coercion violations");
        }
        violations.extend(found);
    }

    ValidationOutcome {
        table,
        violations,
        empty,
    }
}

/// A zero-row table with the declared columns and their storage types.
pub fn empty_frame(schema: &Schema) -> DataFrame {
    let columns = schema
        .columns
        .iter()
        .map(|spec| {
            Series::new_empty(spec.name.as_str().into(), &logical_dtype(spec.logical_type))
                .into_column()
        })
        .collect();
    DataFrame::new(columns).unwrap_or_else(|_| DataFrame::empty())
}
