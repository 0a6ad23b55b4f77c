//! Errors that end a benchmark phase.

use sqlbench_store::{StoreError, Value};
use sqlbench_workload::Key;
use thiserror::Error;

/// The database returned something other than what the benchmark expects.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A result set had the wrong number of columns.
    #[error("unexpected number of fields: expected {expected}, got {actual}")]
    FieldCount {
        /// The expected column count.
        expected: usize,
        /// The column count of the result.
        actual: usize,
    },

    /// A query returned no rows.
    #[error("query returned no rows")]
    MissingRow,

    /// `SELECT 1` returned something other than `1`.
    #[error("unexpected data returned: expected {expected}, got {actual:?}")]
    UnexpectedValue {
        /// The expected value.
        expected: i64,
        /// The value returned, if any.
        actual: Option<Value>,
    },

    /// A lookup found no record for a key that exists in the dataset.
    #[error("no record for key {key}")]
    MissingRecord {
        /// The key looked up.
        key: Key,
    },

    /// A lookup returned contents that differ from the dataset.
    #[error("field{field} of key {key} does not match the dataset")]
    Mismatch {
        /// The key looked up.
        key: Key,
        /// The column looked up.
        field: usize,
    },
}

/// Errors that abort a benchmark phase.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The store failed to connect, prepare, execute or fetch.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The store returned wrong results.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type for benchmark phases.
pub type BenchResult<T> = Result<T, BenchError>;
