//! Parameter and column values.

use crate::error::{Error, Result};

/// A single parameter or column value, as exchanged with the transport.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    Text(String),
}

impl Value {
    /// Returns true for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Int(i64::from(value))
    }
}

macro_rules! impl_from_signed {
    ($($T:ty),+) => {
        $(impl From<$T> for Value {
            fn from(value: $T) -> Self {
                Value::Int(i64::from(value))
            }
        })+
    };
}

macro_rules! impl_from_unsigned {
    ($($T:ty),+) => {
        $(impl From<$T> for Value {
            fn from(value: $T) -> Self {
                Value::UInt(u64::from(value))
            }
        })+
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Trait for decoding a column [`Value`] into a Rust type.
pub trait FromValue: Sized {
    /// Decode from NULL.
    ///
    /// Default implementation returns an error. Override for types that can
    /// represent NULL (like `Option<T>`).
    fn from_null() -> Result<Self> {
        Err(Error::Decode("unexpected NULL value".into()))
    }

    /// Decode from a non-NULL value.
    fn from_value(value: &Value) -> Result<Self>;
}

/// Decode a value, dispatching NULL to [`FromValue::from_null`].
pub(crate) fn decode<T: FromValue>(value: &Value) -> Result<T> {
    match value {
        Value::Null => T::from_null(),
        other => T::from_value(other),
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_null() -> Result<Self> {
        Ok(None)
    }

    fn from_value(value: &Value) -> Result<Self> {
        T::from_value(value).map(Some)
    }
}

impl FromValue for Value {
    fn from_null() -> Result<Self> {
        Ok(Value::Null)
    }

    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Int(v) => Ok(*v),
            Value::UInt(v) => i64::try_from(*v)
                .map_err(|e| Error::Decode(format!("invalid i64: {}", e))),
            Value::Text(s) => s
                .parse()
                .map_err(|e| Error::Decode(format!("invalid i64: {}", e))),
            other => Err(Error::Decode(format!("cannot decode {:?} as i64", other))),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide).map_err(|e| Error::Decode(format!("invalid i32: {}", e)))
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::UInt(v) => Ok(*v),
            Value::Int(v) => u64::try_from(*v)
                .map_err(|e| Error::Decode(format!("invalid u64: {}", e))),
            Value::Text(s) => s
                .parse()
                .map_err(|e| Error::Decode(format!("invalid u64: {}", e))),
            other => Err(Error::Decode(format!("cannot decode {:?} as u64", other))),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Int(v) => Ok(*v != 0),
            Value::UInt(v) => Ok(*v != 0),
            other => Err(Error::Decode(format!("cannot decode {:?} as bool", other))),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Double(v) => Ok(*v),
            Value::Float(v) => Ok(f64::from(*v)),
            Value::Text(s) => s
                .parse()
                .map_err(|e| Error::Decode(format!("invalid f64: {}", e))),
            other => Err(Error::Decode(format!("cannot decode {:?} as f64", other))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Bytes(b) => String::from_utf8(b.clone())
                .map_err(|e| Error::Decode(format!("invalid UTF-8: {}", e))),
            other => Err(Error::Decode(format!("cannot decode {:?} as String", other))),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(Error::Decode(format!("cannot decode {:?} as bytes", other))),
        }
    }
}

/// Trait for turning parameter lists into bound values.
pub trait ToParams {
    /// Number of parameters.
    fn param_count(&self) -> usize;

    /// Convert into the values sent with COM_STMT_EXECUTE.
    fn into_values(self) -> Vec<Value>;
}

impl ToParams for () {
    fn param_count(&self) -> usize {
        0
    }

    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }
}

impl ToParams for Vec<Value> {
    fn param_count(&self) -> usize {
        self.len()
    }

    fn into_values(self) -> Vec<Value> {
        self
    }
}

impl ToParams for &[Value] {
    fn param_count(&self) -> usize {
        self.len()
    }

    fn into_values(self) -> Vec<Value> {
        self.to_vec()
    }
}

// Tuple implementations via macro
macro_rules! impl_to_params {
    ($count:expr, $($idx:tt: $T:ident),+) => {
        impl<$($T: Into<Value>),+> ToParams for ($($T,)+) {
            fn param_count(&self) -> usize {
                $count
            }

            fn into_values(self) -> Vec<Value> {
                vec![$(self.$idx.into()),+]
            }
        }
    };
}

impl_to_params!(1, 0: T0);
impl_to_params!(2, 0: T0, 1: T1);
impl_to_params!(3, 0: T0, 1: T1, 2: T2);
impl_to_params!(4, 0: T0, 1: T1, 2: T2, 3: T3);
impl_to_params!(5, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4);
impl_to_params!(6, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5);
