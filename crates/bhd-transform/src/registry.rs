//! Per-dataset cleaning pipelines.
//!
//! Every dataset runs the generic rules; datasets with known quirks add their
//! own structural and field rules on top.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use polars::prelude::DataFrame;
use tracing::debug;

use crate::error::Result;
use crate::executor::execute_pipeline;
use crate::types::{DatasetPipeline, NormalizationRule, RuleKind, RuleStage};

static STANDARD: LazyLock<RuleRegistry> = LazyLock::new(RuleRegistry::standard);

/// Maps dataset ids to their cleaning rules.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    generic: Vec<RuleKind>,
    datasets: BTreeMap<String, DatasetPipeline>,
}

impl RuleRegistry {
    /// A registry with no rules at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The dashboard's rule set.
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        for column in ["county", "CountyName", "City"] {
            registry.add_generic(title_case(column));
        }
        for column in ["zip_code", "Facility_Zip", "ZIP"] {
            registry.add_generic(zero_pad(column, 5));
        }
        registry.add_generic(zero_pad("ZIP_4", 4));
        for column in ["Latitude", "Longitude"] {
            registry.add_generic(parse_real(column));
        }

        registry.add("ffs_providers_profile", title_case("County"));
        registry.add("ffs_providers_profile", RuleKind::StripDecimal {
            column: "Phone_Number".into(),
        });
        registry.add("ffs_providers_profile", parse_date("Enroll_Status_Eff_DT"));

        registry.add("acs_5yr_estimates", RuleKind::LabelValueReshape);

        let foster = "foster_care_entries_exits";
        registry.add(foster, RuleKind::PromoteHeaderRow {
            marker: "Measure number".into(),
        });
        for column in [
            "Most recent numerator",
            "Most recent denominator",
            "Most recent performance",
        ] {
            registry.add(foster, parse_real(column));
        }
        registry.add(foster, RuleKind::Ratio {
            numerator: "Most recent numerator".into(),
            denominator: "Most recent denominator".into(),
            target: "Rate".into(),
            decimals: 4,
        });
        registry.add(foster, RuleKind::PercentToFraction {
            column: "One-year percent change".into(),
            flag_column: "OneYearChangeFlag".into(),
            threshold: 0.05,
        });

        for id in ["sud_recovery_facilities", "sud_recovery_facilities_geojson"] {
            registry.add(id, zero_pad("County_Code", 2));
            registry.add(id, parse_date("Expiration_Date"));
            registry.add(id, title_case("Facility_City"));
        }
        let sud = "sud_recovery_facilities";
        registry.add(sud, RuleKind::Ratio {
            numerator: "Treatment_Capacity".into(),
            denominator: "Total_Capacity".into(),
            target: "Capacity_Utilization".into(),
            decimals: 2,
        });
        registry.add(sud, RuleKind::ExtractYear {
            column: "Expiration_Date".into(),
            target: "Expiration_Year".into(),
        });
        registry.add(sud, RuleKind::ThresholdFlag {
            column: "Total_Capacity".into(),
            target: "Large_Facility".into(),
            threshold: 50.0,
        });

        let core = "core_set_mental_health";
        registry.add(core, RuleKind::StripSuffix {
            column: "Rate".into(),
            suffix: '%',
        });
        for column in ["Numerator", "Denominator"] {
            registry.add(core, RuleKind::RemoveChar {
                column: column.into(),
                ch: ',',
            });
        }

        for id in ["mat_annual", "mat_quarterly"] {
            registry.add(id, parse_real("members"));
            registry.add(id, RuleKind::ToText {
                column: "Year".into(),
            });
        }

        registry
    }

    /// Add a rule that runs for every dataset.
    pub fn add_generic(&mut self, kind: RuleKind) {
        self.generic.push(kind);
    }

    /// Add a rule for one dataset at the rule's default stage.
    pub fn add(&mut self, dataset_id: &str, kind: RuleKind) {
        self.datasets
            .entry(dataset_id.to_string())
            .or_insert_with(|| DatasetPipeline::new(dataset_id))
            .push(kind);
    }

    /// Dataset ids with rules beyond the generic set.
    pub fn dataset_ids(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    /// The full pipeline for `dataset_id`: its structural rules, then the
    /// generic rules, then its field rules.
    pub fn pipeline(&self, dataset_id: &str) -> DatasetPipeline {
        let mut pipeline = DatasetPipeline::new(dataset_id);
        for (order, kind) in self.generic.iter().enumerate() {
            pipeline.add_rule(NormalizationRule {
                kind: kind.clone(),
                stage: RuleStage::Generic,
                order: order as u32,
            });
        }
        if let Some(specific) = self.datasets.get(dataset_id) {
            for rule in &specific.rules {
                pipeline.add_rule(rule.clone());
            }
        }
        pipeline
    }

    /// Clean one dataset's table.
    pub fn normalize(&self, dataset_id: &str, df: DataFrame) -> Result<DataFrame> {
        let pipeline = self.pipeline(dataset_id);
        debug!(dataset_id, rules = pipeline.len(), "normalizing");
        execute_pipeline(&pipeline, df)
    }
}

/// Clean one dataset's table with the standard rule set.
pub fn normalize(dataset_id: &str, df: DataFrame) -> Result<DataFrame> {
    STANDARD.normalize(dataset_id, df)
}

/// The standard pipeline for `dataset_id`, for display.
pub fn standard_pipeline(dataset_id: &str) -> DatasetPipeline {
    STANDARD.pipeline(dataset_id)
}

fn title_case(column: &str) -> RuleKind {
    RuleKind::TitleCase {
        column: column.into(),
    }
}

fn zero_pad(column: &str, width: usize) -> RuleKind {
    RuleKind::ZeroPad {
        column: column.into(),
        width,
    }
}

fn parse_real(column: &str) -> RuleKind {
    RuleKind::ParseReal {
        column: column.into(),
    }
}

fn parse_date(column: &str) -> RuleKind {
    RuleKind::ParseDate {
        column: column.into(),
    }
}
