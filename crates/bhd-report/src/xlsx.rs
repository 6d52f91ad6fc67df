//! Single workbook, one sheet per dataset.

use std::collections::BTreeSet;
use std::path::Path;

use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::{debug, warn};

use bhd_model::OutputFormat;

use crate::common::{Cell, cell, create_parent};
use crate::error::Result;
use crate::types::{Artifact, ExportTable, FormatReport};

/// Excel's sheet name limit.
pub const MAX_SHEET_NAME: usize = 31;

/// Excel's per-cell text limit.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Write every table into one workbook at `path`.
pub fn write_xlsx(path: &Path, tables: &[ExportTable]) -> FormatReport {
    let mut report = FormatReport::new(OutputFormat::Xlsx, path);
    if let Err(err) = create_parent(path) {
        report.fail_all(tables, &err.to_string());
        return report;
    }

    let mut workbook = Workbook::new();
    let mut used = BTreeSet::new();
    for table in tables {
        let name = unique_sheet_name(&table.dataset_id, &mut used);
        let worksheet = workbook.add_worksheet();
        match fill_sheet(worksheet, &name, &table.table) {
            Ok(()) => {
                debug!(dataset_id = %table.dataset_id, sheet = %name, "sheet written");
                report
                    .written
                    .push((table.dataset_id.clone(), Artifact::Sheet(name)));
            }
            Err(err) => {
                warn!(dataset_id = %table.dataset_id, error = %err, "xlsx sheet failed");
                report.fail_dataset(&table.dataset_id, err.to_string());
            }
        }
    }

    if let Err(err) = workbook.save(path) {
        warn!(path = %path.display(), error = %err, "xlsx workbook not saved");
        report.fail_all(tables, &err.to_string());
    }
    report
}

fn fill_sheet(worksheet: &mut Worksheet, name: &str, df: &DataFrame) -> Result<()> {
    worksheet.set_name(name)?;
    for (col, column) in df.get_columns().iter().enumerate() {
        let col = u16::try_from(col).unwrap_or(u16::MAX);
        worksheet.write_string(0, col, clean_text(column.name()))?;
        for row in 0..df.height() {
            let excel_row = u32::try_from(row + 1).unwrap_or(u32::MAX);
            match cell(column.get(row).unwrap_or(AnyValue::Null)) {
                Cell::Null => {}
                Cell::Integer(v) => {
                    worksheet.write_number(excel_row, col, v as f64)?;
                }
                Cell::Real(v) => {
                    worksheet.write_number(excel_row, col, v)?;
                }
                Cell::Boolean(b) => {
                    worksheet.write_boolean(excel_row, col, b)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(excel_row, col, clean_text(&s))?;
                }
            }
        }
    }
    Ok(())
}

/// Drop control characters Excel rejects and cap the length.
pub fn clean_text(value: &str) -> String {
    value
        .chars()
        .filter(|&c| !is_illegal(c))
        .take(MAX_CELL_CHARS)
        .collect()
}

fn is_illegal(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}')
}

/// Dataset id truncated to 31 characters with Excel's reserved characters
/// replaced.
pub fn sheet_name(dataset_id: &str) -> String {
    let cleaned: String = dataset_id
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    let trimmed = cleaned.trim_matches('\'');
    if trimmed.is_empty() {
        "Sheet".to_string()
    } else {
        trimmed.to_string()
    }
}

/// [`sheet_name`], suffixed with `~n` when it collides with an earlier sheet.
fn unique_sheet_name(dataset_id: &str, used: &mut BTreeSet<String>) -> String {
    let base = sheet_name(dataset_id);
    let mut name = base.clone();
    let mut n = 1;
    while !used.insert(name.to_lowercase()) {
        let suffix = format!("~{n}");
        let keep = MAX_SHEET_NAME - suffix.len();
        name = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
        n += 1;
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_fit_excel_limits() {
        assert_eq!(
            sheet_name("sud_recovery_facilities_geojson_extra"),
            "sud_recovery_facilities_geojson"
        );
        assert_eq!(sheet_name("a/b"), "a_b");

        let mut used = BTreeSet::new();
        let first = unique_sheet_name("managed_care_enrollment_report_2024", &mut used);
        let second = unique_sheet_name("managed_care_enrollment_report_2025", &mut used);
        assert_eq!(first.chars().count(), 31);
        assert_eq!(second, "managed_care_enrollment_repor~1");
    }

    #[test]
    fn text_is_cleaned() {
        assert_eq!(clean_text("a\u{0}b\tc\u{1F}"), "ab\tc");
        assert_eq!(clean_text(&"x".repeat(40_000)).len(), MAX_CELL_CHARS);
    }
}
