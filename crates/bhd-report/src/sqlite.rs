//! Single SQLite database, one table per dataset.

use std::path::Path;

use polars::prelude::{AnyValue, DataFrame};
use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use tracing::{debug, warn};

use bhd_model::OutputFormat;

use crate::common::{Cell, CellKind, cell, cell_kind, create_parent};
use crate::error::{ExportError, Result};
use crate::types::{Artifact, ExportTable, FormatReport};

/// Recreate the database at `path` and write one table per dataset.
///
/// SQLite has no zero-column tables, so a dataset without columns gets a
/// placeholder table holding a single empty `dataset_id` column.
pub fn write_sqlite(path: &Path, tables: &[ExportTable]) -> FormatReport {
    let mut report = FormatReport::new(OutputFormat::Sqlite, path);
    let mut conn = match open_fresh(path) {
        Ok(conn) => conn,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "sqlite database unavailable");
            report.fail_all(tables, &err.to_string());
            return report;
        }
    };

    for table in tables {
        let result = if table.table.width() == 0 {
            write_placeholder(&mut conn, &table.dataset_id)
        } else {
            write_table(&mut conn, &table.dataset_id, &table.table)
        };
        match result {
            Ok(rows) => {
                debug!(dataset_id = %table.dataset_id, rows, "sqlite table written");
                report
                    .written
                    .push((table.dataset_id.clone(), Artifact::Table(table.dataset_id.clone())));
            }
            Err(err) => {
                warn!(dataset_id = %table.dataset_id, error = %err, "sqlite export failed");
                report.fail_dataset(&table.dataset_id, err.to_string());
            }
        }
    }
    report
}

fn open_fresh(path: &Path) -> Result<Connection> {
    create_parent(path)?;
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| ExportError::io(path, e))?;
    }
    Ok(Connection::open(path)?)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn affinity(kind: CellKind) -> &'static str {
    match kind {
        CellKind::Integer | CellKind::Boolean => "INTEGER",
        CellKind::Real => "REAL",
        CellKind::Text => "TEXT",
    }
}

fn sql_value(value: AnyValue<'_>) -> Value {
    match cell(value) {
        Cell::Null => Value::Null,
        Cell::Integer(v) => Value::Integer(v),
        Cell::Real(v) => Value::Real(v),
        Cell::Boolean(b) => Value::Integer(i64::from(b)),
        Cell::Text(s) => Value::Text(s),
    }
}

/// Column of the placeholder table written for datasets without columns.
pub const PLACEHOLDER_COLUMN: &str = "dataset_id";

fn write_placeholder(conn: &mut Connection, name: &str) -> Result<usize> {
    let table = quote_ident(name);
    let tx = conn.transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {table}"), [])?;
    tx.execute(
        &format!("CREATE TABLE {table} ({} TEXT)", quote_ident(PLACEHOLDER_COLUMN)),
        [],
    )?;
    tx.commit()?;
    Ok(0)
}

fn write_table(conn: &mut Connection, name: &str, df: &DataFrame) -> Result<usize> {
    let columns = df.get_columns();
    let definitions: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(c.name()), affinity(cell_kind(c.dtype()))))
        .collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let table = quote_ident(name);

    let tx = conn.transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {table}"), [])?;
    tx.execute(
        &format!("CREATE TABLE {table} ({})", definitions.join(", ")),
        [],
    )?;
    {
        let mut insert = tx.prepare(&format!("INSERT INTO {table} VALUES ({placeholders})"))?;
        for row in 0..df.height() {
            let values = columns
                .iter()
                .map(|c| sql_value(c.get(row).unwrap_or(AnyValue::Null)));
            insert.execute(params_from_iter(values))?;
        }
    }
    tx.commit()?;
    Ok(df.height())
}
