use super::Value;
use crate::{Error, Result};

use std::fmt;

/// The type of a value, a property or a column.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Boolean value
    Bool,

    /// Raw bytes
    Bytes,

    /// 64-bit float
    F64,

    /// Signed 16-bit integer
    I16,

    /// Signed 32-bit integer
    I32,

    /// Signed 64-bit integer
    I64,

    /// String type
    String,

    /// A list of a single type
    List(Box<Type>),

    /// An open property bag, keyed by column or property name
    Map,

    /// An instance of the named model
    Model(String),

    /// Any value. Converters targeting this type pass raw values through.
    #[default]
    Unknown,
}

impl Type {
    pub fn list(ty: impl Into<Self>) -> Self {
        Self::List(Box::new(ty.into()))
    }

    pub fn model(name: impl Into<String>) -> Self {
        Self::Model(name.into())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map)
    }

    pub fn is_model(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Scalar types are read straight out of a single column.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Bytes | Self::F64 | Self::I16 | Self::I32 | Self::I64 | Self::String
        )
    }

    pub fn as_model(&self) -> Option<&str> {
        match self {
            Self::Model(name) => Some(name),
            _ => None,
        }
    }

    /// Item type of a list type.
    pub fn list_item(&self) -> Option<&Type> {
        match self {
            Self::List(item) => Some(item),
            _ => None,
        }
    }

    /// The value a non-nullable property of this type holds before anything
    /// is bound to it.
    pub fn zero(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Bytes => Value::Bytes(vec![]),
            Self::F64 => Value::F64(0.0),
            Self::I16 => Value::I16(0),
            Self::I32 => Value::I32(0),
            Self::I64 => Value::I64(0),
            Self::String => Value::String(String::new()),
            Self::List(_) => Value::List(vec![]),
            Self::Map | Self::Model(_) | Self::Unknown => Value::Null,
        }
    }

    /// Converts `value` into this type.
    ///
    /// Null passes through unchanged. Integers narrow with a range check,
    /// strings parse into numbers and booleans, and every scalar renders into
    /// a string.
    pub fn cast(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(value);
        }

        Ok(match (self, value) {
            (Self::Unknown, value) => value,
            (Self::Bool, value @ Value::Bool(_)) => value,
            (Self::Bool, Value::String(s)) => match parse_bool(&s) {
                Some(b) => Value::Bool(b),
                None => return Err(Error::type_conversion(&Value::String(s), self)),
            },
            (Self::Bool, value) => match value.as_i64() {
                Some(0) => Value::Bool(false),
                Some(1) => Value::Bool(true),
                _ => return Err(Error::type_conversion(&value, self)),
            },
            (Self::Bytes, value @ Value::Bytes(_)) => value,
            (Self::Bytes, Value::String(s)) => Value::Bytes(s.into_bytes()),
            (Self::F64, value @ Value::F64(_)) => value,
            (Self::F64, Value::String(s)) => Value::F64(s.trim().parse()?),
            (Self::F64, value) => match value.as_i64() {
                Some(v) => Value::F64(v as f64),
                None => return Err(Error::type_conversion(&value, self)),
            },
            (Self::I16 | Self::I32 | Self::I64, Value::String(s)) => {
                self.cast_i64(Value::I64(s.trim().parse()?))?
            }
            (Self::I16 | Self::I32 | Self::I64, value) => self.cast_i64(value)?,
            (Self::String, value @ Value::String(_)) => value,
            (Self::String, value) => match value.to_key_string() {
                Some(s) if !matches!(value, Value::List(_) | Value::Object(_)) => Value::String(s),
                _ => return Err(Error::type_conversion(&value, self)),
            },
            (Self::List(item), Value::List(items)) => Value::List(
                items
                    .into_iter()
                    .map(|item_value| item.cast(item_value))
                    .collect::<Result<_>>()?,
            ),
            (Self::Map | Self::Model(_), value @ Value::Object(_)) => value,
            (_, value) => return Err(Error::type_conversion(&value, self)),
        })
    }

    fn cast_i64(&self, value: Value) -> Result<Value> {
        let Some(v) = value.as_i64() else {
            return Err(Error::type_conversion(&value, self));
        };

        Ok(match self {
            Self::I16 => Value::I16(
                i16::try_from(v).map_err(|_| Error::type_conversion(&value, self))?,
            ),
            Self::I32 => Value::I32(
                i32::try_from(v).map_err(|_| Error::type_conversion(&value, self))?,
            ),
            _ => Value::I64(v),
        })
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "TRUE" | "t" | "1" => Some(true),
        "false" | "FALSE" | "f" | "0" => Some(false),
        _ => None,
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("Bool"),
            Self::Bytes => f.write_str("Bytes"),
            Self::F64 => f.write_str("F64"),
            Self::I16 => f.write_str("I16"),
            Self::I32 => f.write_str("I32"),
            Self::I64 => f.write_str("I64"),
            Self::String => f.write_str("String"),
            Self::List(item) => write!(f, "List<{item}>"),
            Self::Map => f.write_str("Map"),
            Self::Model(name) => f.write_str(name),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

impl From<&Self> for Type {
    fn from(value: &Self) -> Self {
        value.clone()
    }
}
