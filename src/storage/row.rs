//! Values and rows for MiniSQL
//!
//! A Value is the closed runtime variant of a literal; a Row maps
//! column names to values in insertion (schema) order. Rows carry their
//! own byte codec for page serialization: a tag byte per value, strings
//! length-prefixed.

use std::cmp::Ordering;
use std::fmt;

use bytes::{Buf, BufMut, BytesMut};
use indexmap::IndexMap;

use crate::catalog::DataType;
use crate::error::{Error, Result};
use crate::sql::ast::Literal;

const TAG_INTEGER: u8 = 1;
const TAG_TEXT: u8 = 2;

/// A typed runtime value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Text(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Int,
            Value::Text(_) => DataType::Varchar,
        }
    }

    /// Compare against a literal of the same kind. Cross-kind
    /// comparisons have no ordering.
    pub fn compare_literal(&self, literal: &Literal) -> Option<Ordering> {
        match (self, literal) {
            (Value::Integer(a), Literal::Integer(b)) => Some(a.cmp(b)),
            (Value::Text(a), Literal::Text(b)) => Some(a.as_str().cmp(b.as_str())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Integer(n) => Value::Integer(n),
            Literal::Text(s) => Value::Text(s),
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        literal.clone().into()
    }
}

/// One stored row: an ordered mapping from column name to value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: IndexMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    /// Set a column value. An existing column keeps its position.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.values.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A new row holding only the named columns, in the given order.
    /// Unknown names are skipped; the analyzer has already validated
    /// them.
    pub fn project(&self, columns: &[String]) -> Row {
        let mut out = Row::new();
        for name in columns {
            if let Some(value) = self.values.get(name) {
                out.set(name.clone(), value.clone());
            }
        }
        out
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.values.len() as u16);
        for (name, value) in &self.values {
            buf.put_u16(name.len() as u16);
            buf.put_slice(name.as_bytes());
            match value {
                Value::Integer(n) => {
                    buf.put_u8(TAG_INTEGER);
                    buf.put_i64(*n);
                }
                Value::Text(s) => {
                    buf.put_u8(TAG_TEXT);
                    buf.put_u32(s.len() as u32);
                    buf.put_slice(s.as_bytes());
                }
            }
        }
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Row> {
        let mut row = Row::new();
        let count = read_u16(buf)? as usize;
        for _ in 0..count {
            let name_len = read_u16(buf)? as usize;
            let name = read_string(buf, name_len)?;
            let tag = read_u8(buf)?;
            let value = match tag {
                TAG_INTEGER => {
                    if buf.remaining() < 8 {
                        return Err(truncated());
                    }
                    Value::Integer(buf.get_i64())
                }
                TAG_TEXT => {
                    let len = read_u32(buf)? as usize;
                    Value::Text(read_string(buf, len)?)
                }
                other => {
                    return Err(Error::CorruptFile(format!("unknown value tag {}", other)));
                }
            };
            row.set(name, value);
        }
        Ok(row)
    }
}

fn truncated() -> Error {
    Error::CorruptFile("truncated row payload".to_string())
}

fn read_u8(buf: &mut impl Buf) -> Result<u8> {
    if buf.remaining() < 1 {
        return Err(truncated());
    }
    Ok(buf.get_u8())
}

fn read_u16(buf: &mut impl Buf) -> Result<u16> {
    if buf.remaining() < 2 {
        return Err(truncated());
    }
    Ok(buf.get_u16())
}

fn read_u32(buf: &mut impl Buf) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(truncated());
    }
    Ok(buf.get_u32())
}

fn read_string(buf: &mut impl Buf, len: usize) -> Result<String> {
    if buf.remaining() < len {
        return Err(truncated());
    }
    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| Error::CorruptFile("invalid utf-8 in row".to_string()))
}
