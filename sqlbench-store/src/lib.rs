//! The database client seam of the benchmark.
//!
//! Drivers never talk to a client library directly. Instead they go through the [`Connector`],
//! [`Connection`] and [`Statement`] traits defined in [`backend`], which model a synchronous,
//! RPC-like database service: connect over a [`Transport`], execute statements, stream query
//! results, and run prepared statements with bound parameter and result buffers.
//!
//! Two backends are available:
//!
//! - [`MysqlConnector`](backend::MysqlConnector) talks to a MySQL server using the blocking
//!   `mysql` client (behind the `mysql` feature, enabled by default).
//! - [`MemoryConnector`](backend::MemoryConnector) answers from the local
//!   [`Dataset`](sqlbench_workload::Dataset). It is used in tests and to dry-run the harness.
//!
//! Resources are released on drop. Connections and statements additionally expose an idempotent
//! `close` so callers can observe release errors.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod backend;
pub mod error;
pub mod transport;
pub mod value;

#[cfg(feature = "mysql")]
pub use crate::backend::MysqlConnector;
pub use crate::backend::{
    BoxedConnection, Connection, Connector, MemoryConnector, ResultStream, Row, Statement,
};
pub use crate::error::{StoreError, StoreResult};
pub use crate::transport::{ConnectTarget, Transport};
pub use crate::value::{ColumnType, Value};
