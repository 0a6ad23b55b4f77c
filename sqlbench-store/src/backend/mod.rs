//! Backend traits and their implementations.

use std::fmt::Debug;

use crate::error::StoreResult;
use crate::transport::{ConnectTarget, Transport};
use crate::value::{ColumnType, Value};

mod common;
mod in_memory;
#[cfg(feature = "mysql")]
mod mysql_client;

pub use in_memory::MemoryConnector;
#[cfg(feature = "mysql")]
pub use mysql_client::MysqlConnector;

/// A connection as returned by [`Connector::connect`].
pub type BoxedConnection = Box<dyn Connection>;

/// A row of column values.
pub type Row = Vec<Value>;

/// Opens connections to a database server.
pub trait Connector: Debug {
    /// The name of the backend, for logs.
    fn name(&self) -> &'static str;

    /// Opens a new connection over `transport`.
    ///
    /// Blocks until the connection is established or failed.
    fn connect(&self, transport: Transport, target: &ConnectTarget)
    -> StoreResult<BoxedConnection>;
}

/// An open connection.
///
/// The connection is released when dropped.
pub trait Connection: Debug {
    /// Executes a statement that returns no rows, such as DDL or an insert.
    fn execute(&mut self, sql: &str) -> StoreResult<()>;

    /// Runs a query and returns a cursor over its rows.
    ///
    /// The cursor borrows the connection, so it must be drained or dropped before the connection
    /// can be used again.
    fn query(&mut self, sql: &str) -> StoreResult<Box<dyn ResultStream + '_>>;

    /// Prepares a statement for repeated execution.
    ///
    /// Any number of statements may be alive at the same time. They borrow the connection, so it
    /// cannot be closed or queried directly until all of them are dropped.
    fn prepare(&self, sql: &str) -> StoreResult<Box<dyn Statement + '_>>;

    /// Closes the connection. Closing twice is a no-op.
    fn close(&mut self) -> StoreResult<()>;
}

/// A streaming row cursor.
pub trait ResultStream {
    /// The number of columns in every row.
    fn column_count(&self) -> usize;

    /// Advances to the next row, returning `None` at the end of the stream.
    fn fetch_row(&mut self) -> StoreResult<Option<Row>>;
}

/// A prepared statement with positional parameter and result buffers.
pub trait Statement {
    /// The number of columns in the result set.
    fn column_count(&self) -> usize;

    /// Binds values to all placeholders, in order.
    fn bind_params(&mut self, params: &[Value]) -> StoreResult<()>;

    /// Binds typed buffers for all result columns, in order.
    fn bind_results(&mut self, columns: &[ColumnType]) -> StoreResult<()>;

    /// Executes the statement with the currently bound parameters.
    fn execute(&mut self) -> StoreResult<()>;

    /// Advances to the next result row, returning `false` at the end of the result set.
    fn fetch_next(&mut self) -> StoreResult<bool>;

    /// The value of the current row at `index`.
    fn column(&self, index: usize) -> Option<&Value>;

    /// Releases the statement on the server. Closing twice is a no-op.
    fn close(&mut self) -> StoreResult<()>;
}
