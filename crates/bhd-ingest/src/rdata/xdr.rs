//! Decoder for R's XDR serialization format (versions 2 and 3).
//!
//! Only the object kinds that can appear inside saved data tables are
//! materialized. Closures, environments and language objects are read so the
//! stream stays aligned, then kept as opaque placeholders.

use std::fmt;

// SEXP type codes.
const NILSXP: u8 = 0;
const SYMSXP: u8 = 1;
const LISTSXP: u8 = 2;
const CLOSXP: u8 = 3;
const ENVSXP: u8 = 4;
const PROMSXP: u8 = 5;
const LANGSXP: u8 = 6;
const SPECIALSXP: u8 = 7;
const BUILTINSXP: u8 = 8;
const CHARSXP: u8 = 9;
const LGLSXP: u8 = 10;
const INTSXP: u8 = 13;
const REALSXP: u8 = 14;
const CPLXSXP: u8 = 15;
const STRSXP: u8 = 16;
const DOTSXP: u8 = 17;
const VECSXP: u8 = 19;
const EXPRSXP: u8 = 20;
const RAWSXP: u8 = 24;
const S4SXP: u8 = 25;

// Pseudo-types used only by the serializer.
const ALTREP_SXP: u8 = 238;
const BASEENV_SXP: u8 = 241;
const EMPTYENV_SXP: u8 = 242;
const NAMESPACESXP: u8 = 249;
const PACKAGESXP: u8 = 248;
const PERSISTSXP: u8 = 247;
const BASENAMESPACE_SXP: u8 = 250;
const MISSINGARG_SXP: u8 = 251;
const UNBOUNDVALUE_SXP: u8 = 252;
const GLOBALENV_SXP: u8 = 253;
const NILVALUE_SXP: u8 = 254;
const REFSXP: u8 = 255;

const HAS_ATTR_BIT: i32 = 1 << 9;
const HAS_TAG_BIT: i32 = 1 << 10;
const LATIN1_MASK: i32 = 1 << 2;

const NA_INTEGER: i32 = i32::MIN;
const MAX_DEPTH: usize = 512;

// Compact sequences expand to at most this many elements per input byte,
// with a floor for tiny streams.
const COMPACT_ELEMENTS_PER_BYTE: usize = 4;
const MIN_COMPACT_LIMIT: usize = 1 << 22;

#[derive(Debug, Clone, PartialEq)]
pub enum RValue {
    Null,
    Symbol(String),
    Logical(Vec<Option<bool>>),
    Integer(Vec<Option<i32>>),
    Real(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
    List(Vec<RObject>),
    Pairlist(Vec<(Option<String>, RObject)>),
    /// Anything read only to keep the stream aligned.
    Opaque(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RObject {
    pub value: RValue,
    pub attributes: Vec<(String, RObject)>,
}

impl RObject {
    fn new(value: RValue) -> Self {
        Self {
            value,
            attributes: Vec::new(),
        }
    }

    fn null() -> Self {
        Self::new(RValue::Null)
    }

    pub fn attribute(&self, name: &str) -> Option<&RObject> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Values of a character attribute such as `names` or `class`.
    pub fn string_attribute(&self, name: &str) -> Option<&[Option<String>]> {
        match &self.attribute(name)?.value {
            RValue::Str(values) => Some(values),
            _ => None,
        }
    }

    pub fn inherits(&self, class: &str) -> bool {
        self.string_attribute("class")
            .is_some_and(|classes| classes.iter().flatten().any(|c| c == class))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError(pub String);

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type DecodeResult<T> = std::result::Result<T, DecodeError>;

fn err<T>(message: impl Into<String>) -> DecodeResult<T> {
    Err(DecodeError(message.into()))
}

/// Decode a serialized stream that starts at the `X\n` format marker.
pub fn decode_stream(bytes: &[u8]) -> DecodeResult<RObject> {
    let mut decoder = Decoder::new(bytes);
    decoder.read_header()?;
    decoder.read_item(0)
}

/// Decode the body of an `RDX2`/`RDX3` workspace file into named objects.
pub fn decode_workspace(bytes: &[u8]) -> DecodeResult<Vec<(String, RObject)>> {
    let root = decode_stream(bytes)?;
    match root.value {
        RValue::Null => Ok(Vec::new()),
        RValue::Pairlist(entries) => Ok(entries
            .into_iter()
            .enumerate()
            .map(|(idx, (tag, value))| (tag.unwrap_or_else(|| format!("object{idx}")), value))
            .collect()),
        _ => err("workspace does not contain a tagged object list"),
    }
}

struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    refs: Vec<RObject>,
}

impl<'a> Decoder<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            refs: Vec::new(),
        }
    }

    fn take(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| DecodeError(format!("unexpected end of data at byte {}", self.pos)))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_int(&mut self) -> DecodeResult<i32> {
        let raw = self.take(4)?;
        Ok(i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn read_double(&mut self) -> DecodeResult<f64> {
        let raw = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw);
        Ok(f64::from_be_bytes(buf))
    }

    fn read_length(&mut self) -> DecodeResult<usize> {
        let len = self.read_int()?;
        if len == -1 {
            // Long vector: two more ints carry the upper and lower halves.
            let upper = self.read_int()? as u32 as u64;
            let lower = self.read_int()? as u32 as u64;
            return usize::try_from((upper << 32) | lower)
                .map_err(|_| DecodeError("vector length overflows usize".into()));
        }
        usize::try_from(len).map_err(|_| DecodeError(format!("negative vector length {len}")))
    }

    /// Guard allocations against lengths that cannot fit in the rest of the data.
    fn check_remaining(&self, len: usize, width: usize) -> DecodeResult<()> {
        let remaining = self.bytes.len() - self.pos;
        if len.saturating_mul(width) > remaining {
            return err(format!("vector of length {len} exceeds the remaining data"));
        }
        Ok(())
    }

    /// Largest compact sequence this stream may expand to.
    fn compact_limit(&self) -> usize {
        self.bytes
            .len()
            .saturating_mul(COMPACT_ELEMENTS_PER_BYTE)
            .max(MIN_COMPACT_LIMIT)
    }

    fn read_header(&mut self) -> DecodeResult<()> {
        let format = self.take(2)?;
        if format != b"X\n" {
            return err("only the XDR serialization format is supported");
        }
        let version = self.read_int()?;
        let _writer_version = self.read_int()?;
        let _min_reader_version = self.read_int()?;
        match version {
            2 => Ok(()),
            3 => {
                let encoding_len = self.read_length()?;
                self.take(encoding_len)?;
                Ok(())
            }
            other => err(format!("unsupported serialization version {other}")),
        }
    }

    fn read_item(&mut self, depth: usize) -> DecodeResult<RObject> {
        let flags = self.read_int()?;
        self.read_item_with_flags(flags, depth)
    }

    fn read_item_with_flags(&mut self, flags: i32, depth: usize) -> DecodeResult<RObject> {
        if depth > MAX_DEPTH {
            return err("object nesting is too deep");
        }
        let sexp_type = (flags & 0xFF) as u8;
        let has_attr = flags & HAS_ATTR_BIT != 0;

        match sexp_type {
            NILVALUE_SXP => Ok(RObject::null()),
            EMPTYENV_SXP | BASEENV_SXP | GLOBALENV_SXP | BASENAMESPACE_SXP => {
                Ok(RObject::new(RValue::Opaque("environment")))
            }
            UNBOUNDVALUE_SXP | MISSINGARG_SXP => Ok(RObject::null()),
            REFSXP => {
                let mut index = flags >> 8;
                if index == 0 {
                    index = self.read_int()?;
                }
                usize::try_from(index - 1)
                    .ok()
                    .and_then(|idx| self.refs.get(idx))
                    .cloned()
                    .ok_or_else(|| DecodeError(format!("dangling reference {index}")))
            }
            PERSISTSXP | NAMESPACESXP | PACKAGESXP => {
                let names = self.read_string_vec(depth)?;
                let object = RObject::new(RValue::Str(names));
                self.refs.push(object.clone());
                Ok(object)
            }
            SYMSXP => {
                let name = self.read_item(depth + 1)?;
                let name = match name.value {
                    RValue::Str(mut values) if values.len() == 1 => {
                        values.pop().flatten().unwrap_or_default()
                    }
                    _ => return err("symbol name is not a string"),
                };
                let object = RObject::new(RValue::Symbol(name));
                self.refs.push(object.clone());
                Ok(object)
            }
            ENVSXP => {
                let _locked = self.read_int()?;
                let slot = self.refs.len();
                self.refs.push(RObject::new(RValue::Opaque("environment")));
                let _enclosure = self.read_item(depth + 1)?;
                let _frame = self.read_item(depth + 1)?;
                let _hashtab = self.read_item(depth + 1)?;
                let _attributes = self.read_item(depth + 1)?;
                Ok(self.refs[slot].clone())
            }
            LISTSXP | LANGSXP | CLOSXP | PROMSXP | DOTSXP => {
                self.read_pairlist(flags, depth)
            }
            ALTREP_SXP => self.read_altrep(depth),
            SPECIALSXP | BUILTINSXP => {
                let len = self.read_length()?;
                self.take(len)?;
                Ok(RObject::new(RValue::Opaque("builtin")))
            }
            _ => {
                let value = self.read_vector(sexp_type, flags, depth)?;
                let mut object = RObject::new(value);
                if has_attr {
                    object.attributes = self.read_attributes(depth)?;
                }
                Ok(object)
            }
        }
    }

    /// Pairlists are read iteratively along the CDR chain so long lists do not
    /// recurse once per element.
    fn read_pairlist(&mut self, first_flags: i32, depth: usize) -> DecodeResult<RObject> {
        let list_type = (first_flags & 0xFF) as u8;
        let mut entries = Vec::new();
        let mut attributes = Vec::new();
        let mut flags = first_flags;
        loop {
            if flags & HAS_ATTR_BIT != 0 {
                let attrs = self.read_attributes(depth)?;
                if entries.is_empty() {
                    attributes = attrs;
                }
            }
            let tag = if flags & HAS_TAG_BIT != 0 {
                match self.read_item(depth + 1)?.value {
                    RValue::Symbol(name) => Some(name),
                    RValue::Str(mut values) if values.len() == 1 => values.pop().flatten(),
                    _ => None,
                }
            } else {
                None
            };
            let car = self.read_item(depth + 1)?;
            entries.push((tag, car));

            let next = self.read_int()?;
            let next_type = (next & 0xFF) as u8;
            if next_type == list_type {
                flags = next;
                continue;
            }
            let tail = self.read_item_with_flags(next, depth + 1)?;
            if !matches!(tail.value, RValue::Null) {
                entries.push((None, tail));
            }
            break;
        }

        let value = match list_type {
            LISTSXP => RValue::Pairlist(entries),
            LANGSXP => RValue::Opaque("call"),
            CLOSXP => RValue::Opaque("closure"),
            PROMSXP => RValue::Opaque("promise"),
            _ => RValue::Opaque("dots"),
        };
        Ok(RObject { value, attributes })
    }

    fn read_attributes(&mut self, depth: usize) -> DecodeResult<Vec<(String, RObject)>> {
        let attrs = self.read_item(depth + 1)?;
        match attrs.value {
            RValue::Pairlist(entries) => Ok(entries
                .into_iter()
                .filter_map(|(tag, value)| tag.map(|t| (t, value)))
                .collect()),
            RValue::Null => Ok(Vec::new()),
            _ => err("attributes are not a pairlist"),
        }
    }

    fn read_string_vec(&mut self, depth: usize) -> DecodeResult<Vec<Option<String>>> {
        if self.read_int()? != 0 {
            return err("names in persistent strings are not supported");
        }
        let len = self.read_length()?;
        self.check_remaining(len, 4)?;
        (0..len)
            .map(|_| match self.read_item(depth + 1)?.value {
                RValue::Str(mut values) if values.len() == 1 => Ok(values.pop().flatten()),
                _ => err("string vector element is not a CHARSXP"),
            })
            .collect()
    }

    fn read_charsxp(&mut self, flags: i32) -> DecodeResult<Option<String>> {
        let len = self.read_int()?;
        if len == -1 {
            return Ok(None);
        }
        let len = usize::try_from(len).map_err(|_| DecodeError("negative string length".into()))?;
        let raw = self.take(len)?;
        let levels = flags >> 12;
        let text = if levels & LATIN1_MASK != 0 {
            raw.iter().map(|b| char::from(*b)).collect()
        } else {
            String::from_utf8_lossy(raw).into_owned()
        };
        Ok(Some(text))
    }

    fn read_vector(&mut self, sexp_type: u8, flags: i32, depth: usize) -> DecodeResult<RValue> {
        match sexp_type {
            NILSXP => Ok(RValue::Null),
            CHARSXP => Ok(RValue::Str(vec![self.read_charsxp(flags)?])),
            LGLSXP => {
                let len = self.read_length()?;
                self.check_remaining(len, 4)?;
                let values = (0..len)
                    .map(|_| {
                        self.read_int().map(|v| match v {
                            NA_INTEGER => None,
                            0 => Some(false),
                            _ => Some(true),
                        })
                    })
                    .collect::<DecodeResult<_>>()?;
                Ok(RValue::Logical(values))
            }
            INTSXP => {
                let len = self.read_length()?;
                self.check_remaining(len, 4)?;
                let values = (0..len)
                    .map(|_| self.read_int().map(|v| (v != NA_INTEGER).then_some(v)))
                    .collect::<DecodeResult<_>>()?;
                Ok(RValue::Integer(values))
            }
            REALSXP => {
                let len = self.read_length()?;
                self.check_remaining(len, 8)?;
                let values = (0..len)
                    .map(|_| self.read_double().map(|v| (!v.is_nan()).then_some(v)))
                    .collect::<DecodeResult<_>>()?;
                Ok(RValue::Real(values))
            }
            CPLXSXP => {
                let len = self.read_length()?;
                self.check_remaining(len, 16)?;
                self.take(len * 16)?;
                Ok(RValue::Opaque("complex"))
            }
            STRSXP => {
                let len = self.read_length()?;
                self.check_remaining(len, 4)?;
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    let item_flags = self.read_int()?;
                    if (item_flags & 0xFF) as u8 != CHARSXP {
                        return err("string vector element is not a CHARSXP");
                    }
                    values.push(self.read_charsxp(item_flags)?);
                }
                Ok(RValue::Str(values))
            }
            VECSXP | EXPRSXP => {
                let len = self.read_length()?;
                self.check_remaining(len, 4)?;
                let items = (0..len)
                    .map(|_| self.read_item(depth + 1))
                    .collect::<DecodeResult<_>>()?;
                Ok(RValue::List(items))
            }
            RAWSXP => {
                let len = self.read_length()?;
                self.take(len)?;
                Ok(RValue::Opaque("raw"))
            }
            S4SXP => Ok(RValue::Opaque("s4")),
            other => err(format!("unsupported R object type {other}")),
        }
    }

    /// Expand the compact and wrapper ALTREP classes R emits for data columns.
    fn read_altrep(&mut self, depth: usize) -> DecodeResult<RObject> {
        let info = self.read_item(depth + 1)?;
        let state = self.read_item(depth + 1)?;
        let attributes = match self.read_item(depth + 1)?.value {
            RValue::Pairlist(entries) => entries
                .into_iter()
                .filter_map(|(tag, value)| tag.map(|t| (t, value)))
                .collect(),
            _ => Vec::new(),
        };

        let class = match &info.value {
            RValue::Pairlist(entries) => match entries.first().map(|(_, v)| &v.value) {
                Some(RValue::Symbol(name)) => name.clone(),
                _ => return err("ALTREP class is not a symbol"),
            },
            _ => return err("ALTREP info is not a pairlist"),
        };

        let value = match class.as_str() {
            "compact_intseq" => {
                let (len, start, step) = compact_params(&state, self.compact_limit())?;
                RValue::Integer(
                    (0..len)
                        .map(|i| Some((start + step * i as f64) as i32))
                        .collect(),
                )
            }
            "compact_realseq" => {
                let (len, start, step) = compact_params(&state, self.compact_limit())?;
                RValue::Real((0..len).map(|i| Some(start + step * i as f64)).collect())
            }
            "deferred_string" => {
                let source = match state.value {
                    RValue::Pairlist(mut entries) if !entries.is_empty() => entries.remove(0).1,
                    _ => return err("deferred string state is malformed"),
                };
                RValue::Str(match source.value {
                    RValue::Integer(values) => values
                        .into_iter()
                        .map(|v| v.map(|n| n.to_string()))
                        .collect(),
                    RValue::Real(values) => values
                        .into_iter()
                        .map(|v| v.map(|n| n.to_string()))
                        .collect(),
                    RValue::Str(values) => values,
                    _ => return err("deferred string source is not atomic"),
                })
            }
            name if name.starts_with("wrap_") => match state.value {
                RValue::Pairlist(mut entries) if !entries.is_empty() => {
                    let wrapped = entries.remove(0).1;
                    let mut object = wrapped;
                    if !attributes.is_empty() {
                        object.attributes = attributes;
                    }
                    return Ok(object);
                }
                _ => return err("wrapper state is malformed"),
            },
            other => return err(format!("unsupported ALTREP class '{other}'")),
        };
        Ok(RObject { value, attributes })
    }
}

fn compact_params(state: &RObject, limit: usize) -> DecodeResult<(usize, f64, f64)> {
    let params: Vec<Option<f64>> = match &state.value {
        RValue::Real(values) => values.clone(),
        RValue::Integer(values) => values.iter().map(|v| v.map(f64::from)).collect(),
        _ => return err("compact sequence state is malformed"),
    };
    let [len, start, step] = params[..] else {
        return err("compact sequence state is malformed");
    };
    let len = len.unwrap_or(0.0);
    if !(0.0..=limit as f64).contains(&len) {
        return err(format!(
            "compact sequence length {len} is out of range (limit {limit})"
        ));
    }
    Ok((len as usize, start.unwrap_or(0.0), step.unwrap_or(1.0)))
}


#[cfg(test)]
mod tests {
    use super::writer::Writer;
    use super::*;

    fn body(w: &Writer) -> &[u8] {
        &w.buf[5..]
    }

    #[test]
    fn decodes_named_vectors() {
        let mut w = Writer::workspace();
        w.cell("counts");
        w.ints(&[Some(1), None, Some(3)], false, false);
        w.cell("labels");
        w.strings(&[Some("a"), None], false);
        w.nil();

        let objects = decode_workspace(body(&w)).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].0, "counts");
        assert_eq!(
            objects[0].1.value,
            RValue::Integer(vec![Some(1), None, Some(3)])
        );
        assert_eq!(
            objects[1].1.value,
            RValue::Str(vec![Some("a".to_string()), None])
        );
    }

    #[test]
    fn resolves_symbol_references_in_attributes() {
        let mut w = Writer::workspace();
        w.cell("x");
        w.reals(&[Some(1.5)], true);
        w.cell("names");
        w.strings(&[Some("a")], false);
        w.nil();
        w.cell("y");
        w.reals(&[Some(2.5)], true);
        w.cell("names");
        w.strings(&[Some("b")], false);
        w.nil();
        w.nil();

        let objects = decode_workspace(body(&w)).unwrap();
        let names = objects[1].1.string_attribute("names").unwrap();
        assert_eq!(names, &[Some("b".to_string())]);
    }

    #[test]
    fn empty_workspace_has_no_objects() {
        let mut w = Writer::workspace();
        w.nil();
        assert!(decode_workspace(body(&w)).unwrap().is_empty());
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let mut w = Writer::workspace();
        w.cell("x");
        w.int(i32::from(REALSXP));
        w.int(1000);
        let error = decode_workspace(body(&w)).unwrap_err();
        assert!(error.0.contains("exceeds"));
    }

    #[test]
    fn expands_compact_sequences() {
        let mut w = Writer::workspace();
        w.cell("rows");
        w.compact_seq("compact_intseq", 4.0, 1.0, 1.0);
        w.cell("steps");
        w.compact_seq("compact_realseq", 3.0, 0.5, 0.25);
        w.nil();

        let objects = decode_workspace(body(&w)).unwrap();
        assert_eq!(
            objects[0].1.value,
            RValue::Integer(vec![Some(1), Some(2), Some(3), Some(4)])
        );
        assert_eq!(
            objects[1].1.value,
            RValue::Real(vec![Some(0.5), Some(0.75), Some(1.0)])
        );
    }

    #[test]
    fn oversized_compact_sequence_is_an_error() {
        let mut w = Writer::workspace();
        w.cell("rows");
        w.compact_seq("compact_intseq", 4.0e9, 1.0, 1.0);
        w.nil();

        let error = decode_workspace(body(&w)).unwrap_err();
        assert!(error.0.contains("out of range"), "{}", error.0);
    }

    #[test]
    fn rejects_non_xdr_streams() {
        let error = decode_stream(b"A\n").unwrap_err();
        assert!(error.0.contains("XDR"));
    }
}
