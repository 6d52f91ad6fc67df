use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The cell could not be coerced to the declared logical type.
    TypeMismatch,
    /// A null in a column declared non-nullable.
    UnexpectedNull,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TypeMismatch => "type_mismatch",
            Self::UnexpectedNull => "unexpected_null",
        }
    }

    pub fn severity(self) -> IssueSeverity {
        match self {
            Self::TypeMismatch => IssueSeverity::Error,
            Self::UnexpectedNull => IssueSeverity::Warning,
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One offending cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub column: String,
    pub row_index: usize,
    pub kind: ViolationKind,
    /// Raw text of the rejected value (type mismatches only).
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
}

/// Violations of one kind in one column, aggregated for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub column: String,
    pub kind: ViolationKind,
    pub severity: IssueSeverity,
    pub count: usize,
    /// First distinct offending values, in row order.
    pub samples: Vec<String>,
}

impl ValidationIssue {
    pub fn message(&self) -> String {
        match self.kind {
            ViolationKind::TypeMismatch => format!(
                "{} value(s) in {} could not be coerced",
                self.count, self.column
            ),
            ViolationKind::UnexpectedNull => {
                format!("{} null value(s) in required column {}", self.count, self.column)
            }
        }
    }
}
