//! Column values carried through the adapter.

use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// A single value in a row, a query parameter or a setting.
///
/// The adapter never interprets values; decoding and encoding belong to the
/// underlying client.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value (Nullable columns).
    Null,
    /// Bool value.
    Bool(bool),
    /// Signed integer (Int8 .. Int64).
    Int(i64),
    /// Unsigned integer (UInt8 .. UInt64).
    UInt(u64),
    /// Floating point (Float32, Float64).
    Float(f64),
    /// UTF-8 string value.
    String(String),
    /// Raw bytes (String columns that are not valid UTF-8, FixedString).
    Bytes(Bytes),
    /// Date value.
    Date(NaiveDate),
    /// DateTime value.
    DateTime(NaiveDateTime),
    /// Array value.
    Array(Vec<Value>),
    /// Tuple value.
    Tuple(Vec<Value>),
}

impl Value {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get the value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to convert to i64.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Try to convert to u64.
    pub fn to_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            Value::Int(v) => u64::try_from(*v).ok(),
            Value::Bool(b) => Some(u64::from(*b)),
            _ => None,
        }
    }

    /// Try to convert to f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get the value as raw bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Try to get the value as a NaiveDateTime.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            Value::Date(d) => d.and_hms_opt(0, 0, 0),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Array(items) => write_seq(f, "[", items, "]"),
            Value::Tuple(items) => write_seq(f, "(", items, ")"),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident as $cast:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(<$cast>::from(v))
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => UInt as u64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt as u64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => String as String,
    Bytes => Bytes as Bytes,
    NaiveDate => Date as NaiveDate,
    NaiveDateTime => DateTime as NaiveDateTime,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::UInt(v as u64)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}
