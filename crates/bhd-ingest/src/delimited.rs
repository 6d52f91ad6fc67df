//! Delimited text reader.
//!
//! Every cell is read as text and empty cells become null; typing is left to
//! the normalizer and validator so suppression markers (`*`, `<11`) survive
//! loading intact.

use std::path::Path;

use polars::prelude::{Column, DataFrame, IntoColumn};
use tracing::{debug, warn};

use bhd_common::{text_series, unique_headers};

use crate::error::{IngestError, Result};

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Options for reading one delimited file.
#[derive(Debug, Clone, Copy)]
pub struct DelimitedOptions {
    pub delimiter: u8,
    /// Title records to discard before the header.
    pub skip_rows: usize,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            skip_rows: 0,
        }
    }
}

/// Pick the candidate delimiter that occurs most often in the first non-empty
/// line, defaulting to a comma.
pub fn sniff_delimiter(sample: &str) -> u8 {
    let Some(line) = sample.lines().find(|l| !l.trim().is_empty()) else {
        return b',';
    };
    let mut best = (b',', 0usize);
    for candidate in CANDIDATE_DELIMITERS {
        let count = line.bytes().filter(|b| *b == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

/// Read a delimited file into a table of text columns.
pub fn read_delimited(path: &Path, options: DelimitedOptions) -> Result<DataFrame> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_delimited(&bytes, options).map_err(|message| IngestError::Delimited {
        path: path.to_path_buf(),
        message,
    })
}

/// Read a `.txt` file, sniffing its delimiter first.
pub fn read_sniffed(path: &Path, skip_rows: usize) -> Result<DataFrame> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let sample_len = bytes.len().min(64 * 1024);
    let delimiter = sniff_delimiter(&String::from_utf8_lossy(&bytes[..sample_len]));
    debug!(path = %path.display(), delimiter = %char::from(delimiter), "delimiter sniffed");
    parse_delimited(
        &bytes,
        DelimitedOptions {
            delimiter,
            skip_rows,
        },
    )
    .map_err(|message| IngestError::Delimited {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_delimited(bytes: &[u8], options: DelimitedOptions) -> std::result::Result<DataFrame, String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(bytes);

    let mut records = reader
        .byte_records()
        .filter(|record| !matches!(record, Ok(r) if is_blank(r)))
        .skip(options.skip_rows);

    let header = match records.next() {
        Some(record) => record.map_err(|e| e.to_string())?,
        None => return Ok(DataFrame::empty()),
    };
    let names = unique_headers(header.iter().map(|f| String::from_utf8_lossy(f).into_owned()));
    let width = names.len();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
    let mut overflow_rows = 0usize;
    for record in records {
        let record = record.map_err(|e| e.to_string())?;
        if record.len() > width {
            overflow_rows += 1;
        }
        for (idx, column) in cells.iter_mut().enumerate() {
            let value = record
                .get(idx)
                .filter(|field| !field.is_empty())
                .map(|field| String::from_utf8_lossy(field).into_owned());
            column.push(value);
        }
    }
    if overflow_rows > 0 {
        warn!(
            overflow_rows,
            columns = width,
            "rows wider than the header were truncated"
        );
    }

    let columns: Vec<Column> = names
        .iter()
        .zip(cells)
        .map(|(name, values)| text_series(name, values).into_column())
        .collect();
    DataFrame::new(columns).map_err(|e| e.to_string())
}

fn is_blank(record: &csv::ByteRecord) -> bool {
    record.len() <= 1 && record.get(0).is_none_or(|f| f.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bhd_common::text_values;

    fn parse(content: &str, options: DelimitedOptions) -> DataFrame {
        parse_delimited(content.as_bytes(), options).unwrap()
    }

    #[test]
    fn reads_text_columns_with_nulls() {
        let df = parse(
            "County,members\nCalaveras,12\nStatewide,\n",
            DelimitedOptions::default(),
        );
        assert_eq!(df.height(), 2);
        let members = text_values(df.column("members").unwrap());
        assert_eq!(members, vec![Some("12".to_string()), None]);
    }

    #[test]
    fn skips_title_rows_and_bom() {
        let df = parse(
            "\u{feff}Mental Health Core Set, 2023\nMeasure_Year,Rate\n2023,45.2%\n",
            DelimitedOptions {
                skip_rows: 1,
                ..DelimitedOptions::default()
            },
        );
        assert_eq!(bhd_common::column_names(&df), vec!["Measure_Year", "Rate"]);
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn pads_short_rows_and_truncates_long_rows() {
        let df = parse("a,b\n1\n2,3,4\n", DelimitedOptions::default());
        let b = text_values(df.column("b").unwrap());
        assert_eq!(b, vec![None, Some("3".to_string())]);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn preserves_quoted_commas_and_spaces() {
        let df = parse(
            "Plan Name, Count of Enrollees \n\"Anthem, Inc.\",\"1,234\"\n",
            DelimitedOptions::default(),
        );
        let names = bhd_common::column_names(&df);
        assert_eq!(names, vec!["Plan Name", " Count of Enrollees "]);
        let count = text_values(df.column(" Count of Enrollees ").unwrap());
        assert_eq!(count[0].as_deref(), Some("1,234"));
    }

    #[test]
    fn empty_input_yields_empty_frame() {
        let df = parse("", DelimitedOptions::default());
        assert_eq!(df.width(), 0);
        assert_eq!(df.height(), 0);
    }

    #[test]
    fn sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter("a\tb\tc\n1\t2\t3"), b'\t');
        assert_eq!(sniff_delimiter("\n\na|b|c"), b'|');
        assert_eq!(sniff_delimiter("a;b,c;d"), b';');
        assert_eq!(sniff_delimiter("single"), b',');
    }
}
