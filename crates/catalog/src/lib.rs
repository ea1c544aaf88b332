//! Schema & record layout: ASCII schema serialization, record width
//! accounting, and typed attribute pack/unpack within a fixed-width
//! record buffer.

#[cfg(test)]
mod tests;

use common::{DbError, DbResult};
use std::fmt::Write as _;
use types::{DataType, Value};

/// One attribute in a table schema: a name and a declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub dtype: DataType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }
}

/// An ordered attribute list plus a key-attribute index set (metadata
/// the core echoes back but never enforces).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    pub attributes: Vec<Attribute>,
    pub keys: Vec<usize>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>, keys: Vec<usize>) -> Self {
        Self { attributes, keys }
    }

    pub fn num_attrs(&self) -> usize {
        self.attributes.len()
    }

    /// `1 + Σ widths + (numAttr - 1)`: the leading sentinel byte, every
    /// attribute's packed width, and one delimiter byte before each
    /// non-first attribute.
    pub fn record_width(&self) -> usize {
        let widths: usize = self.attributes.iter().map(|a| a.dtype.width()).sum();
        1 + widths + self.attributes.len().saturating_sub(1)
    }

    /// Byte offset of attribute `i`'s payload within a packed record:
    /// `1 + i + Σⱼ<ᵢ width(typeⱼ)`.
    fn attr_offset(&self, i: usize) -> DbResult<usize> {
        if i >= self.attributes.len() {
            return Err(DbError::NullParam(format!(
                "attribute index {i} out of range"
            )));
        }
        let preceding: usize = self.attributes[..i].iter().map(|a| a.dtype.width()).sum();
        Ok(1 + i + preceding)
    }

    /// Read and parse attribute `i` out of a packed record buffer.
    pub fn get_attr(&self, record: &[u8], i: usize) -> DbResult<Value> {
        let attr = self
            .attributes
            .get(i)
            .ok_or_else(|| DbError::NullParam(format!("attribute index {i} out of range")))?;
        let offset = self.attr_offset(i)?;
        let width = attr.dtype.width();
        let payload = record.get(offset..offset + width).ok_or_else(|| {
            DbError::ReadFailed(format!("record buffer too short for attribute {i}"))
        })?;
        parse_attr(attr.dtype, payload)
    }

    /// Write the delimiter and formatted payload for attribute `i` into
    /// a packed record buffer.
    pub fn set_attr(&self, record: &mut [u8], i: usize, value: &Value) -> DbResult<()> {
        let attr = self
            .attributes
            .get(i)
            .ok_or_else(|| DbError::NullParam(format!("attribute index {i} out of range")))?;
        let offset = self.attr_offset(i)?;
        let width = attr.dtype.width();
        if offset == 0 || offset + width > record.len() {
            return Err(DbError::WriteFailed(format!(
                "record buffer too short for attribute {i}"
            )));
        }
        record[offset - 1] = if i == 0 { b'|' } else { b',' };
        let payload = format_attr(attr.dtype, value)?;
        record[offset..offset + width].copy_from_slice(&payload);
        Ok(())
    }

    /// ASCII serialization:
    /// `Schema with <N> attributes (a1: TYPE1, a2: TYPE2, …) with keys: (k1, k2, …)`.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        write!(out, "Schema with <{}> attributes (", self.attributes.len()).unwrap();
        for (idx, attr) in self.attributes.iter().enumerate() {
            if idx > 0 {
                out.push_str(", ");
            }
            write!(out, "{}: {}", attr.name, type_tag(attr.dtype)).unwrap();
        }
        out.push_str(") with keys: (");
        for (idx, &k) in self.keys.iter().enumerate() {
            if idx > 0 {
                out.push_str(", ");
            }
            let name = self
                .attributes
                .get(k)
                .map(|a| a.name.as_str())
                .unwrap_or("?");
            out.push_str(name);
        }
        out.push(')');
        out
    }

    /// Parse the ASCII form produced by [`Schema::serialize`].
    pub fn deserialize(text: &str) -> DbResult<Self> {
        let err = |msg: &str| DbError::SchemaDeserializationError(msg.to_string());

        let lt = text.find('<').ok_or_else(|| err("missing '<'"))?;
        let gt = text[lt..]
            .find('>')
            .map(|p| lt + p)
            .ok_or_else(|| err("missing '>'"))?;
        let _count: usize = text[lt + 1..gt]
            .trim()
            .parse()
            .map_err(|_| err("attribute count is not an integer"))?;

        let open_attrs = text[gt..]
            .find('(')
            .map(|p| gt + p)
            .ok_or_else(|| err("missing '(' before attribute list"))?;
        let close_attrs = text[open_attrs..]
            .find(')')
            .map(|p| open_attrs + p)
            .ok_or_else(|| err("missing ')' after attribute list"))?;
        let attrs_body = &text[open_attrs + 1..close_attrs];

        let mut attributes = Vec::new();
        if !attrs_body.trim().is_empty() {
            for part in attrs_body.split(", ") {
                let (name, ty) = part
                    .split_once(':')
                    .ok_or_else(|| err("attribute missing ':'"))?;
                let dtype = parse_type_tag(ty.trim())?;
                attributes.push(Attribute::new(name.trim(), dtype));
            }
        }

        let rest = &text[close_attrs..];
        let open_keys = rest.find('(');
        let keys = match open_keys {
            Some(ok) => {
                let ok = close_attrs + ok;
                let close_keys = text[ok..]
                    .find(')')
                    .map(|p| ok + p)
                    .ok_or_else(|| err("missing ')' after key list"))?;
                let keys_body = text[ok + 1..close_keys].trim();
                if keys_body.is_empty() {
                    Vec::new()
                } else {
                    keys_body
                        .split(", ")
                        .map(|name| {
                            attributes
                                .iter()
                                .position(|a| a.name == name.trim())
                                .ok_or_else(|| err("key references unknown attribute"))
                        })
                        .collect::<DbResult<Vec<_>>>()?
                }
            }
            None => Vec::new(),
        };

        Ok(Schema::new(attributes, keys))
    }
}

fn type_tag(dtype: DataType) -> String {
    match dtype {
        DataType::Int => "INT".to_string(),
        DataType::Float => "FLOAT".to_string(),
        DataType::Bool => "BOOL".to_string(),
        DataType::String(n) => format!("STRING[{n}]"),
    }
}

fn parse_type_tag(tag: &str) -> DbResult<DataType> {
    if tag == "INT" {
        return Ok(DataType::Int);
    }
    if tag == "FLOAT" {
        return Ok(DataType::Float);
    }
    if tag == "BOOL" {
        return Ok(DataType::Bool);
    }
    if let Some(inner) = tag.strip_prefix("STRING[").and_then(|s| s.strip_suffix(']')) {
        let n: u16 = inner
            .parse()
            .map_err(|_| DbError::UnknownDataType(tag.to_string()))?;
        return Ok(DataType::String(n));
    }
    Err(DbError::UnknownDataType(tag.to_string()))
}

/// Format a value: `%04d` for Int, a fixed 15-byte printf float, `0`/`1`
/// for Bool, space-padded/truncated to `n` for String(n).
fn format_attr(dtype: DataType, value: &Value) -> DbResult<Vec<u8>> {
    match (dtype, value) {
        (DataType::Int, Value::Int(v)) => {
            let s = format!("{v:04}");
            if s.len() != 4 {
                return Err(DbError::SerializationError(format!(
                    "int {v} does not fit in 4 ASCII digits"
                )));
            }
            Ok(s.into_bytes())
        }
        (DataType::Float, Value::Float(v)) => {
            let s = format!("{v:.6}");
            let mut bytes = s.into_bytes();
            bytes.resize(15, b' ');
            bytes.truncate(15);
            Ok(bytes)
        }
        (DataType::Bool, Value::Bool(v)) => Ok(vec![if *v { b'1' } else { b'0' }]),
        (DataType::String(n), Value::String(v)) => {
            let mut bytes = v.as_bytes().to_vec();
            bytes.resize(n as usize, b' ');
            bytes.truncate(n as usize);
            Ok(bytes)
        }
        _ => Err(DbError::SerializationError(format!(
            "value {value:?} does not match declared type"
        ))),
    }
}

/// Parse a payload written by [`format_attr`] back into a typed value.
fn parse_attr(dtype: DataType, payload: &[u8]) -> DbResult<Value> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| DbError::SerializationError("attribute payload is not UTF-8".into()))?;
    match dtype {
        DataType::Int => text
            .trim()
            .parse::<i32>()
            .map(Value::Int)
            .map_err(|_| DbError::SerializationError(format!("bad int payload: {text:?}"))),
        DataType::Float => text
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| DbError::SerializationError(format!("bad float payload: {text:?}"))),
        DataType::Bool => match payload.first() {
            Some(b'0') => Ok(Value::Bool(false)),
            Some(b'1') => Ok(Value::Bool(true)),
            _ => Err(DbError::SerializationError(format!(
                "bad bool payload: {text:?}"
            ))),
        },
        DataType::String(_) => Ok(Value::String(text.trim_end_matches(' ').to_string())),
    }
}
