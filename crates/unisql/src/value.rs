//! Parameter and column values
//!
//! [`Value`] is what gets bound to a query and what a [`Row`](crate::Row) holds
//! after decoding. [`ToValue`] and [`FromValue`] convert between it and Rust
//! types.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::error::{Error, SqlResult};

/// Database value enumeration for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name used in decode errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Bytes(b) => JsonValue::Array(b.iter().map(|&x| JsonValue::Number(x.into())).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "<nil>"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bytes(b) => {
                let parts: Vec<String> = b.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(" "))
            }
        }
    }
}

/// Format an argument list the way the SQL log prints it: `[100 John]`
pub fn format_args_list(args: &[Value]) -> String {
    let parts: Vec<String> = args.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(" "))
}

/// Conversion of a Rust value into a bindable [`Value`]
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Conversion of a decoded column [`Value`] into a Rust value
pub trait FromValue: Sized {
    fn from_value(value: Value) -> SqlResult<Self>;
}

fn mismatch<T>(value: &Value, target: &str) -> SqlResult<T> {
    Err(Error::Decode(format!("cannot convert {} value '{}' into {}", value.type_name(), value, target)))
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(*self as f64)
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToValue for uuid::Uuid {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for chrono::DateTime<chrono::Utc> {
    fn to_value(&self) -> Value {
        Value::Text(self.to_rfc3339())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

macro_rules! int_values {
    ($($ty:ty),+) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Int(*self as i64)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> SqlResult<Self> {
                    let wide = i64::from_value(value)?;
                    <$ty>::try_from(wide).map_err(|_| {
                        Error::Decode(format!("integer {} out of range for {}", wide, stringify!($ty)))
                    })
                }
            }
        )+
    };
}

int_values!(i8, i16, i32, u8, u16, u32);

impl ToValue for i64 {
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> SqlResult<Self> {
        match value {
            Value::Int(i) => Ok(i),
            Value::Bool(b) => Ok(b as i64),
            Value::Text(ref s) => match s.trim().parse() {
                Ok(i) => Ok(i),
                Err(_) => mismatch(&value, "i64"),
            },
            other => mismatch(&other, "i64"),
        }
    }
}

/// Values above `i64::MAX` do not fit a signed column value and are sent as
/// decimal text, which the databases coerce back into numeric columns
impl ToValue for u64 {
    fn to_value(&self) -> Value {
        match i64::try_from(*self) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Text(self.to_string()),
        }
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> SqlResult<Self> {
        if let Value::Text(ref s) = value {
            if let Ok(n) = s.trim().parse::<u64>() {
                return Ok(n);
            }
        }
        let wide = i64::from_value(value)?;
        u64::try_from(wide).map_err(|_| Error::Decode(format!("integer {} out of range for u64", wide)))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> SqlResult<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            Value::Text(ref s) => match s.trim().parse() {
                Ok(f) => Ok(f),
                Err(_) => mismatch(&value, "f64"),
            },
            other => mismatch(&other, "f64"),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> SqlResult<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> SqlResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(i) => Ok(i != 0),
            Value::Text(ref s) => match s.trim().to_lowercase().as_str() {
                "1" | "t" | "true" => Ok(true),
                "0" | "f" | "false" => Ok(false),
                _ => mismatch(&value, "bool"),
            },
            other => mismatch(&other, "bool"),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> SqlResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Bytes(b) => String::from_utf8(b)
                .map_err(|e| Error::Decode(format!("column is not valid UTF-8: {}", e))),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => mismatch(&Value::Null, "String"),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> SqlResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => mismatch(&other, "Vec<u8>"),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> SqlResult<Self> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> SqlResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ToValue + ?Sized> From<&T> for Value {
    fn from(value: &T) -> Self {
        value.to_value()
    }
}

macro_rules! owned_into_value {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    value.to_value()
                }
            }
        )+
    };
}

owned_into_value!(
    bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String, Vec<u8>,
    uuid::Uuid, chrono::DateTime<chrono::Utc>
);

impl<T: ToValue> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.to_value()
    }
}

/// Build a `Vec<Value>` from heterogeneous arguments.
///
/// ```
/// let args = unisql::args![5, "John", Some(1.5)];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}
