use thiserror::Error;

/// Errors reported by a store backend.
///
/// Every variant carries the human-readable message of the underlying client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The transport is unavailable, the server is unreachable or authentication was rejected.
    #[error("couldn't connect: {0}")]
    Connection(String),

    /// A statement or query failed on the server.
    #[error("couldn't execute query: {0}")]
    Query(String),

    /// A statement could not be prepared.
    #[error("couldn't prepare statement: {0}")]
    Prepare(String),

    /// Bound parameters or result buffers do not match the statement.
    #[error("couldn't bind: {0}")]
    Bind(String),

    /// Reading the next row failed.
    #[error("couldn't fetch data: {0}")]
    Fetch(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
