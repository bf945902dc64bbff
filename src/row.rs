//! Materialized rows.

use crate::error::{Error, Result};
use crate::value::{FromValue, Value, decode};

/// A row of column values, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(pub Vec<Value>);

impl Row {
    /// Create a row from its values.
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the raw values.
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Decode the value at `idx`.
    pub fn get<T: FromValue>(&self, idx: usize) -> Result<T> {
        let value = self
            .0
            .get(idx)
            .ok_or_else(|| Error::Decode(format!("column index {} out of range", idx)))?;
        decode(value)
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// Trait for decoding a [`Row`] into a Rust type.
pub trait FromRow: Sized {
    /// Decode a row.
    fn from_row(row: &Row) -> Result<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.clone())
    }
}

// Tuple implementations via macro
macro_rules! impl_from_row {
    ($count:expr, $($idx:tt: $T:ident),+) => {
        impl<$($T: FromValue),+> FromRow for ($($T,)+) {
            fn from_row(row: &Row) -> Result<Self> {
                if row.len() < $count {
                    return Err(Error::Decode("not enough columns for tuple".into()));
                }
                Ok(($(row.get::<$T>($idx)?,)+))
            }
        }
    };
}

impl_from_row!(1, 0: T0);
impl_from_row!(2, 0: T0, 1: T1);
impl_from_row!(3, 0: T0, 1: T1, 2: T2);
impl_from_row!(4, 0: T0, 1: T1, 2: T2, 3: T3);
