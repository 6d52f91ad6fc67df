use std::time::SystemTime;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use bhd_model::{DatasetOutputs, IssueSeverity, LoadStatus, OutputFormat};
use bhd_cli::types::{DatasetSummary, RunResult};

pub fn print_summary(result: &RunResult) {
    println!("Output: {}", result.output_dir.display());
    if let Some(time) = result.last_updated {
        println!("Last updated: {}", format_time(time));
    }
    if let Some(path) = &result.quality_report {
        println!("Quality report: {}", path.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Status"),
        header_cell("Loaded"),
        header_cell("Final"),
        header_cell("Violations"),
        header_cell("CSV"),
        header_cell("Parquet"),
        header_cell("SQLite"),
        header_cell("XLSX"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for index in 5..=8 {
        align_column(&mut table, index, CellAlignment::Center);
    }

    let mut total_final = 0usize;
    let mut total_violations = 0usize;
    for summary in &result.datasets {
        total_final += summary.final_rows;
        total_violations += summary.violations;
        table.add_row(vec![
            Cell::new(&summary.dataset_id)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            status_cell(&summary.status, summary.empty),
            Cell::new(summary.loaded_rows),
            Cell::new(summary.final_rows),
            count_cell(summary.violations, Color::Red),
            output_cell(&summary.outputs, OutputFormat::Csv),
            output_cell(&summary.outputs, OutputFormat::Parquet),
            output_cell(&summary.outputs, OutputFormat::Sqlite),
            output_cell(&summary.outputs, OutputFormat::Xlsx),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{}/{} loaded", result.loaded_count(), result.datasets.len()))
            .fg(Color::Cyan),
        dim_cell("-"),
        Cell::new(total_final).add_attribute(Attribute::Bold),
        count_cell(total_violations, Color::Red).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");

    print_issue_table(&result.datasets);
    print_export_errors(result);
}

fn print_issue_table(datasets: &[DatasetSummary]) {
    let mut issues: Vec<(&str, &bhd_model::ValidationIssue)> = datasets
        .iter()
        .flat_map(|d| d.issues.iter().map(move |issue| (d.dataset_id.as_str(), issue)))
        .collect();
    if issues.is_empty() {
        return;
    }
    issues.sort_by(|a, b| {
        b.1.severity
            .cmp(&a.1.severity)
            .then_with(|| a.0.cmp(b.0))
            .then_with(|| a.1.column.cmp(&b.1.column))
    });

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Severity"),
        header_cell("Column"),
        header_cell("Kind"),
        header_cell("Count"),
        header_cell("Examples"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Right);
    for (dataset_id, issue) in issues {
        let examples = if issue.samples.is_empty() {
            dim_cell("-")
        } else {
            Cell::new(issue.samples.join(", "))
        };
        table.add_row(vec![
            Cell::new(dataset_id).fg(Color::Blue),
            severity_cell(issue.severity),
            Cell::new(&issue.column),
            Cell::new(issue.kind.as_str()),
            Cell::new(issue.count).fg(severity_color(issue.severity)),
            examples,
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

fn print_export_errors(result: &RunResult) {
    let mut lines = Vec::new();
    for report in &result.export.reports {
        if let Some(message) = &report.error {
            lines.push(format!("{}: {message}", report.format));
            continue;
        }
        for failure in &report.failures {
            lines.push(format!(
                "{} {}: {}",
                report.format, failure.dataset_id, failure.message
            ));
        }
    }
    if let Some(message) = &result.quality_report_error {
        lines.push(format!("quality report: {message}"));
    }
    for summary in &result.datasets {
        for error in &summary.errors {
            lines.push(format!("{}: {error}", summary.dataset_id));
        }
    }
    if !lines.is_empty() {
        eprintln!("Errors:");
        for line in lines {
            eprintln!("- {line}");
        }
    }
}

fn format_time(time: SystemTime) -> String {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(elapsed) => {
            let secs = i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX);
            let days = secs.div_euclid(86_400);
            i32::try_from(days)
                .ok()
                .and_then(bhd_common::days_to_date)
                .map_or_else(|| format!("{secs}s"), |d| d.format("%Y-%m-%d").to_string())
        }
        Err(_) => "-".to_string(),
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: &LoadStatus, empty: bool) -> Cell {
    let label = if empty {
        format!("{} (empty)", status.label())
    } else {
        status.label().to_string()
    };
    match status {
        LoadStatus::Loaded if empty => Cell::new(label).fg(Color::Yellow),
        LoadStatus::Loaded => Cell::new(label).fg(Color::Green),
        LoadStatus::Unavailable(_) => dim_cell(label),
        LoadStatus::Failed(_) => Cell::new(label)
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
    }
}

fn output_cell(outputs: &DatasetOutputs, format: OutputFormat) -> Cell {
    if outputs.has(format) {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell("-")
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Error => Cell::new("ERROR").fg(Color::Red),
        IssueSeverity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn severity_color(severity: IssueSeverity) -> Color {
    match severity {
        IssueSeverity::Error => Color::Red,
        IssueSeverity::Warning => Color::Yellow,
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
