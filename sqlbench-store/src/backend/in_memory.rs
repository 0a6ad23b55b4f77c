//! In-memory loopback backend.
//!
//! This provides a [`Connector`] that answers the benchmark's statements from the local
//! [`Dataset`] instead of a database server, removing the need for a running server in tests. It
//! understands exactly the statements produced by [`Schema`] plus [`SELECT_ONE`], and accepts but
//! ignores DDL and inserts.
//!
//! The connector is [`Clone`] so tests can hold a handle for inspecting open resources while the
//! runner owns another one.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use sqlbench_workload::schema::{SELECT_ONE, SELECT_ONE_VALUE, Schema};
use sqlbench_workload::{Dataset, Key};

use super::common::StatementBuffers;
use super::{BoxedConnection, Connection, Connector, ResultStream, Row, Statement};
use crate::error::{StoreError, StoreResult};
use crate::transport::{ConnectTarget, Transport};
use crate::value::{ColumnType, Value};

/// Failures injected by tests.
#[derive(Debug, Default)]
struct Faults {
    unavailable: HashSet<Transport>,
    corrupted: HashSet<(Key, usize)>,
}

#[derive(Debug)]
struct Inner {
    dataset: Arc<Dataset>,
    schema: Schema,
    lookups: Vec<String>,
    scan: String,
    faults: Mutex<Faults>,
    executed: AtomicU64,
    open_connections: AtomicUsize,
    open_statements: AtomicUsize,
}

impl Inner {
    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A [`Connector`] serving the contents of a [`Dataset`].
#[derive(Clone, Debug)]
pub struct MemoryConnector {
    inner: Arc<Inner>,
}

impl MemoryConnector {
    /// Creates a connector serving `dataset` under the layout of `schema`.
    pub fn new(dataset: Arc<Dataset>, schema: Schema) -> Self {
        let lookups = (0..schema.field_count())
            .map(|index| schema.select_field(index))
            .collect();
        let scan = schema.scan_all();

        Self {
            inner: Arc::new(Inner {
                dataset,
                schema,
                lookups,
                scan,
                faults: Mutex::default(),
                executed: AtomicU64::new(0),
                open_connections: AtomicUsize::new(0),
                open_statements: AtomicUsize::new(0),
            }),
        }
    }

    /// Makes connections over `transport` fail.
    ///
    /// Applies to all clones of this connector, including ones created earlier.
    pub fn without_transport(self, transport: Transport) -> Self {
        self.inner.faults().unavailable.insert(transport);
        self
    }

    /// Makes lookups of the given field return wrong contents.
    ///
    /// Applies to all clones of this connector, including ones created earlier.
    pub fn corrupt(self, key: Key, field: usize) -> Self {
        self.inner.faults().corrupted.insert((key, field));
        self
    }

    /// The number of statements accepted through [`Connection::execute`].
    pub fn executed_statements(&self) -> u64 {
        self.inner.executed.load(Ordering::Relaxed)
    }

    /// The number of connections that have not been closed yet.
    pub fn open_connections(&self) -> usize {
        self.inner.open_connections.load(Ordering::Relaxed)
    }

    /// The number of prepared statements that have not been closed yet.
    pub fn open_statements(&self) -> usize {
        self.inner.open_statements.load(Ordering::Relaxed)
    }
}

impl Connector for MemoryConnector {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn connect(
        &self,
        transport: Transport,
        _target: &ConnectTarget,
    ) -> StoreResult<BoxedConnection> {
        if self.inner.faults().unavailable.contains(&transport) {
            return Err(StoreError::Connection(format!(
                "{transport} is not available"
            )));
        }

        self.inner.open_connections.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(MemoryConnection {
            inner: Arc::clone(&self.inner),
            closed: false,
        }))
    }
}

#[derive(Debug)]
struct MemoryConnection {
    inner: Arc<Inner>,
    closed: bool,
}

impl MemoryConnection {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed {
            return Err(StoreError::Connection("connection is closed".into()));
        }
        Ok(())
    }
}

impl Connection for MemoryConnection {
    fn execute(&mut self, sql: &str) -> StoreResult<()> {
        self.ensure_open()?;

        let verb = sql.split_whitespace().next().unwrap_or_default();
        let accepted = ["CREATE", "DROP", "INSERT"]
            .iter()
            .any(|known| verb.eq_ignore_ascii_case(known));
        if !accepted {
            return Err(StoreError::Query(format!("unsupported statement: {sql}")));
        }

        self.inner.executed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn query(&mut self, sql: &str) -> StoreResult<Box<dyn ResultStream + '_>> {
        self.ensure_open()?;

        if sql == SELECT_ONE {
            return Ok(Box::new(RowsStream {
                column_count: 1,
                rows: vec![vec![Value::Bytes(SELECT_ONE_VALUE.to_string().into_bytes())]]
                    .into_iter(),
            }));
        }

        if sql == self.inner.scan {
            return Ok(Box::new(ScanStream {
                dataset: &self.inner.dataset,
                column_count: self.inner.schema.field_count(),
                next: 0,
            }));
        }

        Err(StoreError::Query(format!("unsupported query: {sql}")))
    }

    fn prepare(&self, sql: &str) -> StoreResult<Box<dyn Statement + '_>> {
        self.ensure_open()?;

        let kind = if sql == SELECT_ONE {
            StatementKind::SelectOne
        } else if let Some(field) = self.inner.lookups.iter().position(|lookup| lookup == sql) {
            StatementKind::Lookup(field)
        } else {
            return Err(StoreError::Prepare(format!("unsupported statement: {sql}")));
        };

        let buffers = match kind {
            StatementKind::SelectOne => StatementBuffers::new(0, 1),
            StatementKind::Lookup(_) => StatementBuffers::new(1, 1),
        };

        self.inner.open_statements.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(MemoryStatement {
            inner: &self.inner,
            kind,
            buffers,
            closed: false,
        }))
    }

    fn close(&mut self) -> StoreResult<()> {
        if !self.closed {
            self.closed = true;
            self.inner.open_connections.fetch_sub(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.close().ok();
    }
}

struct RowsStream {
    column_count: usize,
    rows: std::vec::IntoIter<Row>,
}

impl ResultStream for RowsStream {
    fn column_count(&self) -> usize {
        self.column_count
    }

    fn fetch_row(&mut self) -> StoreResult<Option<Row>> {
        Ok(self.rows.next())
    }
}

struct ScanStream<'c> {
    dataset: &'c Dataset,
    column_count: usize,
    next: Key,
}

impl ResultStream for ScanStream<'_> {
    fn column_count(&self) -> usize {
        self.column_count
    }

    fn fetch_row(&mut self) -> StoreResult<Option<Row>> {
        let Some(record) = self.dataset.record(self.next) else {
            return Ok(None);
        };

        self.next += 1;
        Ok(Some(record.fields().map(Value::from).collect()))
    }
}

#[derive(Clone, Copy, Debug)]
enum StatementKind {
    SelectOne,
    Lookup(usize),
}

struct MemoryStatement<'c> {
    inner: &'c Inner,
    kind: StatementKind,
    buffers: StatementBuffers,
    closed: bool,
}

impl MemoryStatement<'_> {
    fn lookup(&self, field: usize) -> StoreResult<Option<Row>> {
        let key = match self.buffers.params()? {
            [Value::Int(key)] if *key >= 0 => *key as Key,
            [other] => {
                return Err(StoreError::Bind(format!(
                    "expected a non-negative integer key, got {other:?}"
                )));
            }
            _ => unreachable!("parameter count is checked on bind"),
        };

        let Some(contents) = self.inner.dataset.lookup(key, field) else {
            return Ok(None);
        };

        let mut contents = contents.to_vec();
        if self.inner.faults().corrupted.contains(&(key, field)) {
            contents.reverse();
            if let Some(first) = contents.first_mut() {
                *first = b'#';
            }
        }

        Ok(Some(vec![Value::Bytes(contents)]))
    }
}

impl Statement for MemoryStatement<'_> {
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
        if self.closed {
            return Err(StoreError::Query("statement is closed".into()));
        }

        let row = match self.kind {
            StatementKind::SelectOne => Some(vec![Value::Int(SELECT_ONE_VALUE)]),
            StatementKind::Lookup(field) => self.lookup(field)?,
        };
        self.buffers.store(row);
        Ok(())
    }

    fn fetch_next(&mut self) -> StoreResult<bool> {
        self.buffers.fetch_next()
    }

    fn column(&self, index: usize) -> Option<&Value> {
        self.buffers.column(index)
    }

    fn close(&mut self) -> StoreResult<()> {
        if !self.closed {
            self.closed = true;
            self.inner.open_statements.fetch_sub(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

impl Drop for MemoryStatement<'_> {
    fn drop(&mut self) {
        self.close().ok();
    }
}
