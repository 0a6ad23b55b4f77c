//! Values exchanged with the store and typed result buffers.

use crate::error::{StoreError, StoreResult};

/// A single column value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// An integer.
    Int(i64),
    /// A byte string, also used for text.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns the integer value, parsing textual integers.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            Value::Bytes(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok(),
            Value::Null => None,
        }
    }

    /// Returns the contents of a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// The number of payload bytes this value occupies on the wire.
    pub fn payload_len(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Int(_) => size_of::<i64>(),
            Value::Bytes(bytes) => bytes.len(),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl TryFrom<u64> for Value {
    type Error = StoreError;

    fn try_from(value: u64) -> StoreResult<Self> {
        i64::try_from(value)
            .map(Value::Int)
            .map_err(|_| StoreError::Bind(format!("{value} does not fit a signed integer")))
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

/// The type of a bound result buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// A 64-bit integer buffer.
    Int,
    /// A byte buffer holding at most `width` bytes.
    Bytes {
        /// Capacity of the buffer.
        width: usize,
    },
}

impl ColumnType {
    /// Converts a fetched value into this buffer type.
    ///
    /// `NULL` fits every buffer. Text is accepted for integer buffers if it parses as an integer.
    pub fn coerce(self, value: Value) -> StoreResult<Value> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (ColumnType::Int, Value::Int(value)) => Ok(Value::Int(value)),
            (ColumnType::Int, value @ Value::Bytes(_)) => {
                value.as_int().map(Value::Int).ok_or_else(|| {
                    StoreError::Bind(format!("expected an integer column, got {value:?}"))
                })
            }
            (ColumnType::Bytes { width }, Value::Int(value)) => {
                ColumnType::Bytes { width }.coerce(Value::Bytes(value.to_string().into_bytes()))
            }
            (ColumnType::Bytes { width }, Value::Bytes(bytes)) => {
                if bytes.len() > width {
                    return Err(StoreError::Bind(format!(
                        "{}-byte value does not fit into a {width}-byte buffer",
                        bytes.len()
                    )));
                }
                Ok(Value::Bytes(bytes))
            }
        }
    }
}
