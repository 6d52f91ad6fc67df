//! Jurisdiction filter: keep the county of interest plus statewide rows.

use polars::prelude::{BooleanChunked, DataFrame, NewChunkedArray};
use tracing::{info, warn};

use bhd_common::{has_column, text_values};
use bhd_model::FilterSpec;

use crate::error::Result;

/// Keep the rows whose filter column, as text, is one of the accepted values.
///
/// Without a spec the table is returned unchanged. When the filter column is
/// missing the table is also returned unchanged, with a warning.
pub fn filter_rows(dataset_id: &str, spec: Option<&FilterSpec>, df: DataFrame) -> Result<DataFrame> {
    let Some(spec) = spec else {
        return Ok(df);
    };
    if df.height() == 0 {
        return Ok(df);
    }
    if !has_column(&df, &spec.column) {
        warn!(
            dataset_id,
            column = %spec.column,
            "filter column not found, rows kept unfiltered"
        );
        return Ok(df);
    }

    let keep: Vec<bool> = text_values(df.column(&spec.column)?)
        .iter()
        .map(|value| value.as_deref().is_some_and(|v| spec.accepts(v)))
        .collect();
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let before = df.height();
    let filtered = df.filter(&mask)?;
    let after = filtered.height();
    if before != after {
        info!(dataset_id, before, after, column = %spec.column, "jurisdiction filter applied");
    }
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bhd_common::text_series;
    use polars::prelude::IntoColumn;

    fn geography(values: &[&str]) -> DataFrame {
        DataFrame::new(vec![
            text_series(
                "Geography",
                values.iter().map(|v| Some((*v).to_string())).collect(),
            )
            .into_column(),
        ])
        .unwrap()
    }

    #[test]
    fn keeps_accepted_values_in_order() {
        let spec = FilterSpec::new("Geography", &["Calaveras", "State"]);
        let df = geography(&["Amador", "State", "Calaveras", "calaveras", "State"]);
        let out = filter_rows("abgar_appeals", Some(&spec), df).unwrap();
        let kept = text_values(out.column("Geography").unwrap());
        assert_eq!(
            kept,
            vec![
                Some("State".to_string()),
                Some("Calaveras".to_string()),
                Some("State".to_string())
            ]
        );
    }

    #[test]
    fn missing_column_or_spec_is_a_no_op() {
        let df = geography(&["Amador"]);
        let spec = FilterSpec::new("County", &["Calaveras"]);
        let out = filter_rows("mat_annual", Some(&spec), df.clone()).unwrap();
        assert_eq!(out.height(), 1);
        let out = filter_rows("nsduh", None, df).unwrap();
        assert_eq!(out.height(), 1);
    }
}
