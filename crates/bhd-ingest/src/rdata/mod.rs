//! R workspace (`.RData`/`.rda`) reader.
//!
//! Files may be stored raw or gzip-compressed. The first saved object becomes
//! the table: a data.frame maps column by column, an atomic vector becomes a
//! single column named after the object.

mod xdr;

use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use tracing::{debug, warn};

use bhd_common::{date_series, days_to_date, format_numeric, text_series, unique_headers};

use crate::error::{IngestError, Result};
use xdr::{RObject, RValue};

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];

pub fn read_rdata(path: &Path) -> Result<DataFrame> {
    let raw = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let fail = |message: String| IngestError::RData {
        path: path.to_path_buf(),
        message,
    };

    let bytes = decompress(raw).map_err(fail)?;
    let objects = if let Some(body) = bytes
        .strip_prefix(b"RDX2\n")
        .or_else(|| bytes.strip_prefix(b"RDX3\n"))
    {
        xdr::decode_workspace(body).map_err(|e| fail(e.0))?
    } else if bytes.starts_with(b"X\n") {
        vec![("value".to_string(), xdr::decode_stream(&bytes).map_err(|e| fail(e.0))?)]
    } else if bytes.starts_with(b"RDA") || bytes.starts_with(b"RDB") {
        return Err(fail("only XDR-encoded R data files are supported".to_string()));
    } else {
        return Err(fail("not an R data file".to_string()));
    };

    debug!(path = %path.display(), objects = objects.len(), "R workspace decoded");
    let Some((name, object)) = objects.into_iter().next() else {
        warn!(path = %path.display(), "R data file contains no objects");
        return Ok(DataFrame::empty());
    };
    object_to_frame(&name, object).map_err(fail)
}

fn decompress(raw: Vec<u8>) -> std::result::Result<Vec<u8>, String> {
    if raw.starts_with(GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut out)
            .map_err(|e| format!("gzip decompression failed: {e}"))?;
        return Ok(out);
    }
    if raw.starts_with(BZIP2_MAGIC) {
        return Err("bzip2-compressed R data is not supported".to_string());
    }
    if raw.starts_with(XZ_MAGIC) {
        return Err("xz-compressed R data is not supported".to_string());
    }
    Ok(raw)
}

fn object_to_frame(name: &str, object: RObject) -> std::result::Result<DataFrame, String> {
    match &object.value {
        RValue::List(_) => list_to_frame(object),
        RValue::Logical(_) | RValue::Integer(_) | RValue::Real(_) | RValue::Str(_) => {
            let series = vector_to_series(name, &object)?;
            DataFrame::new(vec![series.into_column()]).map_err(|e| e.to_string())
        }
        RValue::Null => Ok(DataFrame::empty()),
        other => Err(format!("object '{name}' is not a table ({})", kind_name(other))),
    }
}

fn list_to_frame(object: RObject) -> std::result::Result<DataFrame, String> {
    let raw_names: Vec<String> = object
        .string_attribute("names")
        .map(|names| names.iter().map(|n| n.clone().unwrap_or_default()).collect())
        .unwrap_or_default();
    let RValue::List(items) = object.value else {
        return Err("expected a list".to_string());
    };
    let names = unique_headers(
        (0..items.len()).map(|idx| raw_names.get(idx).cloned().unwrap_or_default()),
    );
    let columns = items
        .iter()
        .zip(&names)
        .map(|(item, name)| vector_to_series(name, item).map(IntoColumn::into_column))
        .collect::<std::result::Result<Vec<Column>, String>>()?;
    DataFrame::new(columns).map_err(|e| e.to_string())
}

fn vector_to_series(name: &str, object: &RObject) -> std::result::Result<Series, String> {
    let series = match &object.value {
        RValue::Integer(codes) if object.inherits("factor") => {
            let levels = object.string_attribute("levels").unwrap_or(&[]);
            let labels: Vec<Option<String>> = codes
                .iter()
                .map(|code| {
                    code.and_then(|c| usize::try_from(c - 1).ok())
                        .and_then(|idx| levels.get(idx).cloned().flatten())
                })
                .collect();
            text_series(name, labels)
        }
        RValue::Real(values) if object.inherits("Date") => {
            let dates: Vec<_> = values
                .iter()
                .map(|v| v.and_then(|days| days_to_date(days.floor() as i32)))
                .collect();
            date_series(name, &dates).map_err(|e| e.to_string())?
        }
        RValue::Logical(values) => Series::new(name.into(), values.clone()),
        RValue::Integer(values) => Series::new(name.into(), values.clone()),
        RValue::Real(values) => Series::new(name.into(), values.clone()),
        RValue::Str(values) => text_series(name, values.clone()),
        RValue::Null => text_series(name, Vec::new()),
        RValue::List(items) => {
            warn!(column = name, "nested list column rendered as text");
            text_series(name, items.iter().map(scalar_text).collect())
        }
        other => return Err(format!("column '{name}' has unsupported type {}", kind_name(other))),
    };
    Ok(series)
}

fn scalar_text(object: &RObject) -> Option<String> {
    match &object.value {
        RValue::Str(v) if v.len() == 1 => v[0].clone(),
        RValue::Integer(v) if v.len() == 1 => v[0].map(|n| n.to_string()),
        RValue::Real(v) if v.len() == 1 => v[0].map(format_numeric),
        RValue::Logical(v) if v.len() == 1 => v[0].map(|b| b.to_string()),
        _ => None,
    }
}

fn kind_name(value: &RValue) -> &'static str {
    match value {
        RValue::Null => "NULL",
        RValue::Symbol(_) => "symbol",
        RValue::Logical(_) => "logical",
        RValue::Integer(_) => "integer",
        RValue::Real(_) => "double",
        RValue::Str(_) => "character",
        RValue::List(_) => "list",
        RValue::Pairlist(_) => "pairlist",
        RValue::Opaque(kind) => kind,
    }
}
