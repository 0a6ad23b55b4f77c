//! MySQL backend on top of the blocking `mysql` client.
//!
//! TCP and Unix sockets are supported everywhere, named pipes only on Windows. The client has no
//! shared memory support, so connecting over [`Transport::SharedMemory`] always fails.
//!
//! Connection type can be verified on the server with:
//!
//! ```sql
//! SELECT connection_type FROM performance_schema.threads
//! WHERE connection_type IS NOT NULL AND processlist_state IS NOT NULL;
//! ```

use std::cell::RefCell;
use std::fmt;

use mysql::prelude::Queryable;
use mysql::{Conn, Opts, OptsBuilder, Params, QueryResult, Text};
use secrecy::ExposeSecret;

use super::common::StatementBuffers;
use super::{BoxedConnection, Connection, Connector, ResultStream, Row, Statement};
use crate::error::{StoreError, StoreResult};
use crate::transport::{ConnectTarget, Transport};
use crate::value::{ColumnType, Value};

/// Host used for TCP connections when none is given.
const DEFAULT_HOST: &str = "127.0.0.1";
/// The default MySQL port.
const DEFAULT_PORT: u16 = 3306;
/// The client library's default socket path.
const DEFAULT_SOCKET: &str = "/tmp/mysql.sock";
/// The server's default pipe name.
const DEFAULT_PIPE: &str = r"\\.\pipe\MySQL";

/// A [`Connector`] for MySQL servers.
#[derive(Clone, Copy, Debug, Default)]
pub struct MysqlConnector;

impl MysqlConnector {
    fn opts(transport: Transport, target: &ConnectTarget) -> StoreResult<Opts> {
        let builder = OptsBuilder::new()
            .user(Some(target.user.as_str()))
            .pass(Some(target.password.expose_secret()))
            .db_name(target.database.as_deref());

        let builder = match transport {
            Transport::Tcp => builder
                .ip_or_hostname(Some(target.host.as_deref().unwrap_or(DEFAULT_HOST)))
                .tcp_port(target.port.unwrap_or(DEFAULT_PORT))
                .prefer_socket(false),
            Transport::Socket if cfg!(unix) => {
                builder.socket(Some(target.socket.as_deref().unwrap_or(DEFAULT_SOCKET)))
            }
            Transport::NamedPipe if cfg!(windows) => {
                builder.socket(Some(target.socket.as_deref().unwrap_or(DEFAULT_PIPE)))
            }
            transport => {
                return Err(StoreError::Connection(format!(
                    "{transport} is not supported by the mysql client on this platform"
                )));
            }
        };

        Ok(builder.into())
    }
}

impl Connector for MysqlConnector {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn connect(
        &self,
        transport: Transport,
        target: &ConnectTarget,
    ) -> StoreResult<BoxedConnection> {
        let opts = Self::opts(transport, target)?;
        let conn = Conn::new(opts).map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::debug!(%transport, connection_id = conn.connection_id(), "connected");
        Ok(Box::new(MysqlConnection {
            conn: RefCell::new(Some(conn)),
        }))
    }
}

struct MysqlConnection {
    conn: RefCell<Option<Conn>>,
}

impl MysqlConnection {
    fn conn_mut(&mut self) -> StoreResult<&mut Conn> {
        self.conn.get_mut().as_mut().ok_or_else(closed)
    }
}

impl fmt::Debug for MysqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = self.conn.try_borrow().map(|conn| conn.is_some()).ok();
        f.debug_struct("MysqlConnection")
            .field("open", &open)
            .finish()
    }
}

impl Connection for MysqlConnection {
    fn execute(&mut self, sql: &str) -> StoreResult<()> {
        self.conn_mut()?
            .query_drop(sql)
            .map_err(|e| StoreError::Query(format!("{}\n{e}", abbreviate(sql))))
    }

    fn query(&mut self, sql: &str) -> StoreResult<Box<dyn ResultStream + '_>> {
        let result = self
            .conn_mut()?
            .query_iter(sql)
            .map_err(|e| StoreError::Query(format!("{}\n{e}", abbreviate(sql))))?;

        Ok(Box::new(MysqlRows { result }))
    }

    fn prepare(&self, sql: &str) -> StoreResult<Box<dyn Statement + '_>> {
        let stmt = with_conn(&self.conn, |conn| {
            conn.prep(sql)
                .map_err(|e| StoreError::Prepare(format!("{sql}\n{e}")))
        })?;
        let buffers =
            StatementBuffers::new(usize::from(stmt.num_params()), usize::from(stmt.num_columns()));

        Ok(Box::new(MysqlStatement {
            conn: &self.conn,
            stmt: Some(stmt),
            buffers,
        }))
    }

    fn close(&mut self) -> StoreResult<()> {
        // Dropping the client connection sends `COM_QUIT`.
        self.conn.get_mut().take();
        Ok(())
    }
}

struct MysqlRows<'c> {
    result: QueryResult<'c, 'c, 'c, Text>,
}

impl ResultStream for MysqlRows<'_> {
    fn column_count(&self) -> usize {
        self.result.columns().as_ref().len()
    }

    fn fetch_row(&mut self) -> StoreResult<Option<Row>> {
        match self.result.next() {
            Some(Ok(row)) => Ok(Some(row.unwrap().into_iter().map(from_mysql).collect())),
            Some(Err(e)) => Err(StoreError::Fetch(e.to_string())),
            None => Ok(None),
        }
    }
}

/// A server-side prepared statement.
///
/// Statements share their connection through a [`RefCell`], which is only borrowed for the
/// duration of a single round trip.
struct MysqlStatement<'c> {
    conn: &'c RefCell<Option<Conn>>,
    stmt: Option<mysql::Statement>,
    buffers: StatementBuffers,
}

impl Statement for MysqlStatement<'_> {
    fn column_count(&self) -> usize {
        self.buffers.column_count()
    }

    fn bind_params(&mut self, params: &[Value]) -> StoreResult<()> {
        self.buffers.bind_params(params)
    }

    fn bind_results(&mut self, columns: &[ColumnType]) -> StoreResult<()> {
        self.buffers.bind_results(columns)
    }

    fn execute(&mut self) -> StoreResult<()> {
        let stmt = self
            .stmt
            .as_ref()
            .ok_or_else(|| StoreError::Query("statement is closed".into()))?;

        let params = match self.buffers.params()? {
            [] => Params::Empty,
            params => Params::Positional(params.iter().map(to_mysql).collect()),
        };

        let rows = with_conn(self.conn, |conn| {
            conn.exec_iter(stmt, params)
                .map_err(|e| StoreError::Query(e.to_string()))?
                .map(|row| row.map(|row| row.unwrap().into_iter().map(from_mysql).collect()))
                .collect::<Result<Vec<Row>, _>>()
                .map_err(|e| StoreError::Fetch(e.to_string()))
        })?;

        self.buffers.store(rows);
        Ok(())
    }

    fn fetch_next(&mut self) -> StoreResult<bool> {
        self.buffers.fetch_next()
    }

    fn column(&self, index: usize) -> Option<&Value> {
        self.buffers.column(index)
    }

    fn close(&mut self) -> StoreResult<()> {
        match self.stmt.take() {
            Some(stmt) => with_conn(self.conn, |conn| {
                conn.close(stmt)
                    .map_err(|e| StoreError::Query(format!("couldn't close statement: {e}")))
            }),
            None => Ok(()),
        }
    }
}

impl Drop for MysqlStatement<'_> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            tracing::warn!(error = &error as &dyn std::error::Error, "leaking statement");
        }
    }
}

fn closed() -> StoreError {
    StoreError::Connection("connection is closed".into())
}

/// Runs `f` with exclusive access to the shared client connection.
fn with_conn<T>(
    conn: &RefCell<Option<Conn>>,
    f: impl FnOnce(&mut Conn) -> StoreResult<T>,
) -> StoreResult<T> {
    let mut guard = conn
        .try_borrow_mut()
        .map_err(|_| StoreError::Connection("connection is busy".into()))?;
    f(guard.as_mut().ok_or_else(closed)?)
}

fn from_mysql(value: mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Bytes(bytes) => Value::Bytes(bytes),
        mysql::Value::Int(value) => Value::Int(value),
        mysql::Value::UInt(value) => Value::Int(value as i64),
        other => Value::Bytes(other.as_sql(true).into_bytes()),
    }
}

fn to_mysql(value: &Value) -> mysql::Value {
    match value {
        Value::Null => mysql::Value::NULL,
        Value::Int(value) => mysql::Value::Int(*value),
        Value::Bytes(bytes) => mysql::Value::Bytes(bytes.clone()),
    }
}

/// Shortens bulk insert statements for error messages.
fn abbreviate(sql: &str) -> &str {
    const MAX_LEN: usize = 200;
    match sql.char_indices().nth(MAX_LEN) {
        Some((end, _)) => &sql[..end],
        None => sql,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_memory_is_unsupported() {
        let target = ConnectTarget::new("root", "");
        let result = MysqlConnector.connect(Transport::SharedMemory, &target);

        assert!(matches!(result, Err(StoreError::Connection(_))));
    }

    #[test]
    #[cfg(unix)]
    fn named_pipe_is_unsupported_on_unix() {
        let target = ConnectTarget::new("root", "");
        assert!(MysqlConnector::opts(Transport::NamedPipe, &target).is_err());
        assert!(MysqlConnector::opts(Transport::Socket, &target).is_ok());
    }

    #[test]
    fn tcp_defaults() {
        let target = ConnectTarget::new("root", "secret");
        let opts = MysqlConnector::opts(Transport::Tcp, &target).unwrap();

        assert_eq!(opts.get_ip_or_hostname(), DEFAULT_HOST);
        assert_eq!(opts.get_tcp_port(), DEFAULT_PORT);
        assert_eq!(opts.get_user(), Some("root"));
        assert_eq!(opts.get_socket(), None);
    }

    #[test]
    fn value_conversion() {
        assert_eq!(from_mysql(mysql::Value::UInt(1)), Value::Int(1));
        assert_eq!(from_mysql(mysql::Value::NULL), Value::Null);
        assert_eq!(
            from_mysql(mysql::Value::Bytes(b"ab".to_vec())),
            Value::Bytes(b"ab".to_vec())
        );
        assert_eq!(to_mysql(&Value::Int(7)), mysql::Value::Int(7));
    }

    #[test]
    fn abbreviates_long_statements() {
        let sql = "x".repeat(500);
        assert_eq!(abbreviate(&sql).len(), 200);
        assert_eq!(abbreviate("SELECT 1"), "SELECT 1");
    }
}
