//! Core types for the rule-driven normalizer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// When a rule runs relative to the others in a pipeline.
///
/// Structural rules reshape the table, so they run before any rule that
/// addresses columns by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStage {
    Structural,
    Generic,
    Dataset,
}

impl RuleStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Generic => "generic",
            Self::Dataset => "dataset",
        }
    }
}

/// A single cleaning operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
#[non_exhaustive]
pub enum RuleKind {
    /// Capitalise the first letter of each alphabetic run ("SAN ANDREAS" -> "San Andreas").
    TitleCase { column: String },

    /// Integer-looking values left-padded with zeros to `width` digits.
    ZeroPad { column: String, width: usize },

    /// Coerce to Float64; unparseable values become null, never zero.
    ParseReal { column: String },

    /// Drop a zero fractional part left over from float storage (`2095551234.0`).
    StripDecimal { column: String },

    /// Coerce to a Date column.
    ParseDate { column: String },

    /// Two-column label/value reshape for census extracts.
    LabelValueReshape,

    /// Promote the first row containing `marker` to column names.
    PromoteHeaderRow { marker: String },

    /// Percentage text to a fraction plus a threshold flag on its magnitude.
    PercentToFraction {
        column: String,
        flag_column: String,
        threshold: f64,
    },

    /// `numerator / denominator` rounded to `decimals`.
    Ratio {
        numerator: String,
        denominator: String,
        target: String,
        decimals: u32,
    },

    /// `column > threshold`, null counting as false.
    ThresholdFlag {
        column: String,
        target: String,
        threshold: f64,
    },

    /// Calendar year of a date column.
    ExtractYear { column: String, target: String },

    /// Strip trailing `suffix` characters from text values.
    StripSuffix { column: String, suffix: char },

    /// Remove every occurrence of `ch` from text values.
    RemoveChar { column: String, ch: char },

    /// Render any value as text.
    ToText { column: String },
}

impl RuleKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TitleCase { .. } => "title_case",
            Self::ZeroPad { .. } => "zero_pad",
            Self::ParseReal { .. } => "parse_real",
            Self::StripDecimal { .. } => "strip_decimal",
            Self::ParseDate { .. } => "parse_date",
            Self::LabelValueReshape => "label_value_reshape",
            Self::PromoteHeaderRow { .. } => "promote_header_row",
            Self::PercentToFraction { .. } => "percent_to_fraction",
            Self::Ratio { .. } => "ratio",
            Self::ThresholdFlag { .. } => "threshold_flag",
            Self::ExtractYear { .. } => "extract_year",
            Self::StripSuffix { .. } => "strip_suffix",
            Self::RemoveChar { .. } => "remove_char",
            Self::ToText { .. } => "to_text",
        }
    }

    /// Columns that must exist for the rule to run.
    pub fn required_columns(&self) -> Vec<&str> {
        match self {
            Self::TitleCase { column }
            | Self::ZeroPad { column, .. }
            | Self::ParseReal { column }
            | Self::StripDecimal { column }
            | Self::ParseDate { column }
            | Self::PercentToFraction { column, .. }
            | Self::ThresholdFlag { column, .. }
            | Self::ExtractYear { column, .. }
            | Self::StripSuffix { column, .. }
            | Self::RemoveChar { column, .. }
            | Self::ToText { column } => vec![column.as_str()],
            Self::Ratio {
                numerator,
                denominator,
                ..
            } => vec![numerator.as_str(), denominator.as_str()],
            Self::LabelValueReshape | Self::PromoteHeaderRow { .. } => Vec::new(),
        }
    }

    pub fn default_stage(&self) -> RuleStage {
        match self {
            Self::LabelValueReshape | Self::PromoteHeaderRow { .. } => RuleStage::Structural,
            _ => RuleStage::Dataset,
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TitleCase { column } => write!(f, "title case `{column}`"),
            Self::ZeroPad { column, width } => write!(f, "zero pad `{column}` to {width}"),
            Self::ParseReal { column } => write!(f, "parse `{column}` as real"),
            Self::StripDecimal { column } => write!(f, "strip decimal from `{column}`"),
            Self::ParseDate { column } => write!(f, "parse `{column}` as date"),
            Self::LabelValueReshape => f.write_str("reshape to Label/Value/County"),
            Self::PromoteHeaderRow { marker } => {
                write!(f, "promote header row containing \"{marker}\"")
            }
            Self::PercentToFraction {
                column,
                flag_column,
                threshold,
            } => write!(
                f,
                "percent `{column}` to fraction, flag `{flag_column}` when |x| > {threshold}"
            ),
            Self::Ratio {
                numerator,
                denominator,
                target,
                decimals,
            } => write!(
                f,
                "`{target}` = `{numerator}` / `{denominator}` rounded to {decimals}"
            ),
            Self::ThresholdFlag {
                column,
                target,
                threshold,
            } => write!(f, "`{target}` = `{column}` > {threshold}"),
            Self::ExtractYear { column, target } => write!(f, "`{target}` = year of `{column}`"),
            Self::StripSuffix { column, suffix } => write!(f, "strip '{suffix}' from `{column}`"),
            Self::RemoveChar { column, ch } => write!(f, "remove '{ch}' from `{column}`"),
            Self::ToText { column } => write!(f, "render `{column}` as text"),
        }
    }
}

/// A rule positioned within a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRule {
    pub kind: RuleKind,
    pub stage: RuleStage,
    /// Position within the stage.
    pub order: u32,
}

/// Ordered rules for one dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetPipeline {
    pub dataset_id: String,
    pub rules: Vec<NormalizationRule>,
}

impl DatasetPipeline {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            rules: Vec::new(),
        }
    }

    pub fn add_rule(&mut self, rule: NormalizationRule) {
        self.rules.push(rule);
    }

    /// Append `kind` at its default stage, after the rules already there.
    pub fn push(&mut self, kind: RuleKind) {
        let stage = kind.default_stage();
        self.push_at(stage, kind);
    }

    pub fn push_at(&mut self, stage: RuleStage, kind: RuleKind) {
        let order = self
            .rules
            .iter()
            .filter(|r| r.stage == stage)
            .map(|r| r.order + 1)
            .max()
            .unwrap_or(0);
        self.add_rule(NormalizationRule { kind, stage, order });
    }

    /// Rules sorted by (stage, order).
    pub fn rules_ordered(&self) -> Vec<&NormalizationRule> {
        let mut rules: Vec<&NormalizationRule> = self.rules.iter().collect();
        rules.sort_by_key(|r| (r.stage, r.order));
        rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_sort_by_stage_then_order() {
        let mut pipeline = DatasetPipeline::new("foster_care_entries_exits");
        pipeline.push(RuleKind::ParseReal {
            column: "Most recent numerator".into(),
        });
        pipeline.push_at(
            RuleStage::Generic,
            RuleKind::TitleCase {
                column: "county".into(),
            },
        );
        pipeline.push(RuleKind::PromoteHeaderRow {
            marker: "Measure number".into(),
        });
        pipeline.push(RuleKind::ParseReal {
            column: "Most recent denominator".into(),
        });

        let names: Vec<String> = pipeline
            .rules_ordered()
            .iter()
            .map(|r| r.kind.to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "promote header row containing \"Measure number\"",
                "title case `county`",
                "parse `Most recent numerator` as real",
                "parse `Most recent denominator` as real",
            ]
        );
    }

    #[test]
    fn ratio_requires_both_operands() {
        let kind = RuleKind::Ratio {
            numerator: "Treatment_Capacity".into(),
            denominator: "Total_Capacity".into(),
            target: "Capacity_Utilization".into(),
            decimals: 2,
        };
        assert_eq!(
            kind.required_columns(),
            vec!["Treatment_Capacity", "Total_Capacity"]
        );
        assert_eq!(kind.name(), "ratio");
    }
}
