//! Rule execution.
//!
//! Applies a [`DatasetPipeline`] to a table, rule by rule. Rules whose
//! columns are absent are skipped; cell values that do not fit a rule become
//! null or stay untouched, never an error.

use polars::prelude::{AnyValue, Column, DataFrame, DataType, NamedFrom, Series};
use tracing::{debug, trace, warn};

use bhd_common::{
    any_to_f64, date_series, days_to_date, has_column, parse_date, replace_column, text_series,
    text_values,
};
use chrono::{Datelike, NaiveDate};

use crate::error::Result;
use crate::normalization::{
    parse_percent, ratio, remove_char, strip_decimal, strip_suffix, title_case, zero_pad,
};
use crate::reshape::{promote_header_row, reshape_label_value};
use crate::types::{DatasetPipeline, RuleKind};

/// Run every rule of `pipeline` against `df` in (stage, order) order.
pub fn execute_pipeline(pipeline: &DatasetPipeline, mut df: DataFrame) -> Result<DataFrame> {
    for rule in pipeline.rules_ordered() {
        let missing: Vec<&str> = rule
            .kind
            .required_columns()
            .into_iter()
            .filter(|column| !has_column(&df, column))
            .collect();
        if !missing.is_empty() {
            trace!(rule = rule.kind.name(), ?missing, "rule skipped, column absent");
            continue;
        }
        df = apply_rule(&rule.kind, df)?;
        debug!(
            rule = rule.kind.name(),
            stage = rule.stage.as_str(),
            rows = df.height(),
            "rule applied"
        );
    }
    Ok(df)
}

/// Apply one rule. Callers are expected to have checked required columns.
pub fn apply_rule(kind: &RuleKind, mut df: DataFrame) -> Result<DataFrame> {
    match kind {
        RuleKind::LabelValueReshape => return reshape_label_value(df),
        RuleKind::PromoteHeaderRow { marker } => return promote_header_row(df, marker),
        RuleKind::TitleCase { column } => {
            if df.column(column)?.dtype() != &DataType::String {
                debug!(column = %column, "title case skipped for non-text column");
                return Ok(df);
            }
            map_text(&mut df, column, |v| Some(title_case(v)))?;
        }
        RuleKind::ZeroPad { column, width } => {
            let untouched = map_text_counting(&mut df, column, |v| zero_pad(v, *width))?;
            if untouched > 0 {
                warn!(
                    column = %column,
                    untouched,
                    "non-numeric values left unpadded"
                );
            }
        }
        RuleKind::ParseReal { column } => {
            let values = real_values(df.column(column)?);
            replace_column(&mut df, Series::new(column.as_str().into(), values))?;
        }
        RuleKind::StripDecimal { column } => {
            map_text_counting(&mut df, column, strip_decimal)?;
        }
        RuleKind::ParseDate { column } => {
            let values = date_values(df.column(column)?)?;
            if let Some(values) = values {
                replace_column(&mut df, date_series(column, &values)?)?;
            }
        }
        RuleKind::PercentToFraction {
            column,
            flag_column,
            threshold,
        } => {
            let source = df.column(column)?;
            let values: Vec<Option<f64>> = (0..source.len())
                .map(|idx| match source.get(idx).unwrap_or(AnyValue::Null) {
                    AnyValue::String(s) => parse_percent(s),
                    AnyValue::StringOwned(s) => parse_percent(&s),
                    other => any_to_f64(other),
                })
                .collect();
            let flags: Vec<bool> = values
                .iter()
                .map(|v| v.is_some_and(|x| x.abs() > *threshold))
                .collect();
            replace_column(&mut df, Series::new(column.as_str().into(), values))?;
            replace_column(&mut df, Series::new(flag_column.as_str().into(), flags))?;
        }
        RuleKind::Ratio {
            numerator,
            denominator,
            target,
            decimals,
        } => {
            let num = real_values(df.column(numerator)?);
            let den = real_values(df.column(denominator)?);
            let values: Vec<Option<f64>> = num
                .into_iter()
                .zip(den)
                .map(|(n, d)| ratio(n, d, *decimals))
                .collect();
            replace_column(&mut df, Series::new(target.as_str().into(), values))?;
        }
        RuleKind::ThresholdFlag {
            column,
            target,
            threshold,
        } => {
            let flags: Vec<bool> = real_values(df.column(column)?)
                .into_iter()
                .map(|v| v.is_some_and(|x| x > *threshold))
                .collect();
            replace_column(&mut df, Series::new(target.as_str().into(), flags))?;
        }
        RuleKind::ExtractYear { column, target } => {
            let source = df.column(column)?;
            let dates = match date_values(source)? {
                Some(parsed) => parsed,
                None => existing_dates(source),
            };
            let years: Vec<Option<i32>> = dates.iter().map(|d| d.map(|d| d.year())).collect();
            replace_column(&mut df, Series::new(target.as_str().into(), years))?;
        }
        RuleKind::StripSuffix { column, suffix } => {
            map_text(&mut df, column, |v| Some(strip_suffix(v, *suffix)))?;
        }
        RuleKind::RemoveChar { column, ch } => {
            map_text(&mut df, column, |v| Some(remove_char(v, *ch)))?;
        }
        RuleKind::ToText { column } => {
            let values = text_values(df.column(column)?);
            replace_column(&mut df, text_series(column, values))?;
        }
    }
    Ok(df)
}

/// Map non-null text values through `f`; `None` from `f` becomes null.
fn map_text<F>(df: &mut DataFrame, column: &str, f: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let values: Vec<Option<String>> = text_values(df.column(column)?)
        .into_iter()
        .map(|v| v.and_then(|v| f(&v)))
        .collect();
    replace_column(df, text_series(column, values))?;
    Ok(())
}

/// Map non-null text values through `f`, keeping the original where `f`
/// declines. Returns the number of values kept as they were.
fn map_text_counting<F>(df: &mut DataFrame, column: &str, f: F) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let mut untouched = 0usize;
    let values: Vec<Option<String>> = text_values(df.column(column)?)
        .into_iter()
        .map(|v| {
            v.map(|v| {
                f(&v).unwrap_or_else(|| {
                    untouched += 1;
                    v
                })
            })
        })
        .collect();
    replace_column(df, text_series(column, values))?;
    Ok(untouched)
}

fn real_values(column: &Column) -> Vec<Option<f64>> {
    (0..column.len())
        .map(|idx| any_to_f64(column.get(idx).unwrap_or(AnyValue::Null)))
        .collect()
}

/// Parse a column into dates, or `None` when it is already a Date column.
fn date_values(column: &Column) -> Result<Option<Vec<Option<NaiveDate>>>> {
    match column.dtype() {
        DataType::Date => Ok(None),
        DataType::Datetime(_, _) => {
            let cast = column.cast(&DataType::Date)?;
            Ok(Some(existing_dates(&cast)))
        }
        _ => Ok(Some(
            text_values(column)
                .iter()
                .map(|v| v.as_deref().and_then(parse_date))
                .collect(),
        )),
    }
}

fn existing_dates(column: &Column) -> Vec<Option<NaiveDate>> {
    (0..column.len())
        .map(|idx| match column.get(idx).unwrap_or(AnyValue::Null) {
            AnyValue::Date(days) => days_to_date(days),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bhd_common::column_names;
    use polars::prelude::IntoColumn;

    fn text(name: &str, values: &[Option<&str>]) -> Column {
        text_series(name, values.iter().map(|v| v.map(str::to_string)).collect()).into_column()
    }

    fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        text_values(df.column(name).unwrap())
    }

    #[test]
    fn zero_pad_keeps_non_numeric_values() {
        let df = DataFrame::new(vec![text(
            "ZIP",
            &[Some("95249.0"), Some("5222"), Some("CA"), None],
        )])
        .unwrap();
        let out = apply_rule(
            &RuleKind::ZeroPad {
                column: "ZIP".into(),
                width: 5,
            },
            df,
        )
        .unwrap();
        assert_eq!(
            strings(&out, "ZIP"),
            vec![
                Some("95249".to_string()),
                Some("05222".to_string()),
                Some("CA".to_string()),
                None
            ]
        );
    }

    #[test]
    fn parse_real_nulls_suppressed_counts() {
        let df = DataFrame::new(vec![text("members", &[Some("12"), Some("*"), Some("<11")])])
            .unwrap();
        let out = apply_rule(
            &RuleKind::ParseReal {
                column: "members".into(),
            },
            df,
        )
        .unwrap();
        let members = out.column("members").unwrap();
        assert_eq!(members.dtype(), &DataType::Float64);
        assert_eq!(members.get(0).unwrap(), AnyValue::Float64(12.0));
        assert_eq!(members.null_count(), 2);
    }

    #[test]
    fn percent_to_fraction_sets_flag() {
        let df = DataFrame::new(vec![text(
            "One-year percent change",
            &[Some("5.2%"), Some("-3%"), None, Some("n/a")],
        )])
        .unwrap();
        let out = apply_rule(
            &RuleKind::PercentToFraction {
                column: "One-year percent change".into(),
                flag_column: "OneYearChangeFlag".into(),
                threshold: 0.05,
            },
            df,
        )
        .unwrap();
        let flags: Vec<Option<bool>> = out
            .column("OneYearChangeFlag")
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(flags, vec![Some(true), Some(false), Some(false), Some(false)]);
        let change = out.column("One-year percent change").unwrap();
        assert_eq!(change.null_count(), 2);
    }

    #[test]
    fn ratio_threshold_and_year_for_facilities() {
        let df = DataFrame::new(vec![
            Series::new("Treatment_Capacity".into(), [Some(30.0), Some(40.0), Some(10.0)])
                .into_column(),
            Series::new("Total_Capacity".into(), [Some(0.0), Some(50.0), Some(51.0)]).into_column(),
            text(
                "Expiration_Date",
                &[Some("2026-06-30"), Some("03/31/2025"), None],
            ),
        ])
        .unwrap();
        let rules = [
            RuleKind::ParseDate {
                column: "Expiration_Date".into(),
            },
            RuleKind::Ratio {
                numerator: "Treatment_Capacity".into(),
                denominator: "Total_Capacity".into(),
                target: "Capacity_Utilization".into(),
                decimals: 2,
            },
            RuleKind::ExtractYear {
                column: "Expiration_Date".into(),
                target: "Expiration_Year".into(),
            },
            RuleKind::ThresholdFlag {
                column: "Total_Capacity".into(),
                target: "Large_Facility".into(),
                threshold: 50.0,
            },
        ];
        let mut out = df;
        for rule in &rules {
            out = apply_rule(rule, out).unwrap();
        }

        let util = out.column("Capacity_Utilization").unwrap();
        assert_eq!(util.get(0).unwrap(), AnyValue::Null);
        assert_eq!(util.get(1).unwrap(), AnyValue::Float64(0.8));
        let large: Vec<Option<bool>> = out
            .column("Large_Facility")
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(large, vec![Some(false), Some(false), Some(true)]);
        let years = out.column("Expiration_Year").unwrap();
        assert_eq!(years.get(0).unwrap(), AnyValue::Int32(2026));
        assert_eq!(years.get(1).unwrap(), AnyValue::Int32(2025));
        assert_eq!(out.column("Expiration_Date").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn skips_rules_with_absent_columns() {
        let mut pipeline = DatasetPipeline::new("mat_annual");
        pipeline.push(RuleKind::ParseReal {
            column: "members".into(),
        });
        let df = DataFrame::new(vec![text("County", &[Some("Calaveras")])]).unwrap();
        let out = execute_pipeline(&pipeline, df.clone()).unwrap();
        assert!(out.equals_missing(&df));
        assert_eq!(column_names(&out), vec!["County"]);
    }

    #[test]
    fn text_cleanup_rules() {
        let df = DataFrame::new(vec![
            text("Rate", &[Some("45.2%"), None]),
            text("Numerator", &[Some("1,234"), Some("56")]),
        ])
        .unwrap();
        let out = apply_rule(
            &RuleKind::StripSuffix {
                column: "Rate".into(),
                suffix: '%',
            },
            df,
        )
        .unwrap();
        let out = apply_rule(
            &RuleKind::RemoveChar {
                column: "Numerator".into(),
                ch: ',',
            },
            out,
        )
        .unwrap();
        assert_eq!(strings(&out, "Rate"), vec![Some("45.2".to_string()), None]);
        assert_eq!(strings(&out, "Numerator")[0].as_deref(), Some("1234"));
    }

    #[test]
    fn to_text_renders_whole_floats() {
        let df = DataFrame::new(vec![
            Series::new("Year".into(), [Some(2020.0), None]).into_column(),
        ])
        .unwrap();
        let out = apply_rule(
            &RuleKind::ToText {
                column: "Year".into(),
            },
            df,
        )
        .unwrap();
        assert_eq!(strings(&out, "Year"), vec![Some("2020".to_string()), None]);
        assert_eq!(out.column("Year").unwrap().dtype(), &DataType::String);
    }
}
