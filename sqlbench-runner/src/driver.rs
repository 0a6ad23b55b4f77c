//! The benchmark drivers.
//!
//! Every driver runs against a single open connection and times its whole loop as one
//! measurement. Statements are prepared and result buffers are bound before the clock starts, so
//! only the round trips themselves are measured. Returned values are validated inside the loop,
//! and the first validation failure aborts the driver.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlbench_store::{ColumnType, Connection, Statement, StoreError, Value};
use sqlbench_workload::schema::{SELECT_ONE, SELECT_ONE_VALUE};
use sqlbench_workload::zipf::ZipfError;
use sqlbench_workload::{Dataset, Key, Prng, Schema, Throughput, ZipfSampler, try_measure};

use crate::error::{BenchError, BenchResult, ValidationError};

/// The benchmarks that can be run over a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// `SELECT 1` as a plain text query.
    SmallQuery,
    /// `SELECT 1` as a prepared statement.
    Prepared,
    /// Zipf-distributed point lookups, validated against the dataset.
    Lookup,
    /// A full scan of the benchmark table.
    Scan,
}

impl DriverKind {
    /// All drivers, in the order they run by default.
    pub const ALL: [DriverKind; 4] = [
        DriverKind::SmallQuery,
        DriverKind::Prepared,
        DriverKind::Lookup,
        DriverKind::Scan,
    ];

    /// Whether the driver reads the benchmark table.
    pub fn needs_dataset(self) -> bool {
        matches!(self, DriverKind::Lookup | DriverKind::Scan)
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriverKind::SmallQuery => "very small tx",
            DriverKind::Prepared => "very small prepared statements",
            DriverKind::Lookup => "zipf lookups",
            DriverKind::Scan => "full table scan",
        })
    }
}

/// A single lookup request: which column of which record to fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lookup {
    /// The record key, drawn from a zipfian distribution.
    pub key: Key,
    /// The column, drawn uniformly.
    pub field: usize,
}

/// Draws `count` lookup requests over `dataset`.
///
/// The sequence only depends on the dataset shape, `skew` and `seed`, so every transport can
/// replay the same requests.
pub fn generate_lookups(
    dataset: &Dataset,
    skew: f64,
    seed: u64,
    count: usize,
) -> Result<Vec<Lookup>, ZipfError> {
    let mut sampler = ZipfSampler::new(dataset.len(), skew, Prng::new(seed))?;
    let keys = sampler.generate_zipf_lookup_keys(count);

    // Separate stream, so changing the field count does not change the keys.
    let mut fields = Prng::new(seed.rotate_left(32));
    let field_count = dataset.field_count();

    Ok(keys
        .into_iter()
        .map(|key| Lookup {
            key,
            field: fields.below(field_count),
        })
        .collect())
}

/// Everything a driver needs besides the connection.
#[derive(Clone, Copy, Debug)]
pub struct DriverContext<'a> {
    /// The dataset loaded into the benchmark table.
    pub dataset: &'a Dataset,
    /// Layout of the benchmark table.
    pub schema: &'a Schema,
    /// Iterations of the `SELECT 1` drivers.
    pub small_tx_iterations: u64,
    /// Requests issued by the lookup driver.
    pub lookups: &'a [Lookup],
}

/// The outcome of a driver that ran to completion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriverReport {
    /// The driver that ran.
    pub kind: DriverKind,
    /// Operation and byte counts.
    pub throughput: Throughput,
}

/// Runs the driver `kind` over `conn`.
pub fn run_driver(
    kind: DriverKind,
    conn: &mut dyn Connection,
    ctx: &DriverContext<'_>,
) -> BenchResult<DriverReport> {
    let throughput = match kind {
        DriverKind::SmallQuery => small_query(conn, ctx.small_tx_iterations)?,
        DriverKind::Prepared => prepared(conn, ctx.small_tx_iterations)?,
        DriverKind::Lookup => lookup(conn, ctx.dataset, ctx.schema, ctx.lookups)?,
        DriverKind::Scan => scan(conn, ctx.dataset, ctx.schema)?,
    };

    tracing::debug!(
        driver = %kind,
        operations = throughput.operations,
        elapsed = throughput.elapsed,
        "driver finished"
    );
    Ok(DriverReport { kind, throughput })
}

fn expect_one(value: Option<&Value>) -> Result<(), ValidationError> {
    match value.and_then(Value::as_int) {
        Some(SELECT_ONE_VALUE) => Ok(()),
        _ => Err(ValidationError::UnexpectedValue {
            expected: SELECT_ONE_VALUE,
            actual: value.cloned(),
        }),
    }
}

/// Issues `SELECT 1` as a text query `iterations` times.
pub fn small_query(conn: &mut dyn Connection, iterations: u64) -> BenchResult<Throughput> {
    let elapsed = try_measure(|| {
        for _ in 0..iterations {
            let mut rows = conn.query(SELECT_ONE)?;

            let columns = rows.column_count();
            if columns != 1 {
                return Err(ValidationError::FieldCount {
                    expected: 1,
                    actual: columns,
                }
                .into());
            }

            let row = rows.fetch_row()?.ok_or(ValidationError::MissingRow)?;
            expect_one(row.first())?;
        }
        Ok::<_, BenchError>(())
    })?;

    Ok(Throughput {
        operations: iterations,
        bytes: 0,
        elapsed,
    })
}

/// Executes a prepared `SELECT 1` `iterations` times.
pub fn prepared(conn: &mut dyn Connection, iterations: u64) -> BenchResult<Throughput> {
    let mut stmt = conn.prepare(SELECT_ONE)?;
    stmt.bind_params(&[])?;
    stmt.bind_results(&[ColumnType::Int])?;

    let elapsed = try_measure(|| {
        for _ in 0..iterations {
            stmt.execute()?;
            if !stmt.fetch_next()? {
                return Err(ValidationError::MissingRow.into());
            }
            expect_one(stmt.column(0))?;
        }
        Ok::<_, BenchError>(())
    })?;

    stmt.close()?;
    Ok(Throughput {
        operations: iterations,
        bytes: 0,
        elapsed,
    })
}

fn prepare_lookup<'c>(
    conn: &'c dyn Connection,
    schema: &Schema,
    field: usize,
    width: usize,
) -> BenchResult<Box<dyn Statement + 'c>> {
    let mut stmt = conn.prepare(&schema.select_field(field))?;
    stmt.bind_results(&[ColumnType::Bytes { width }])?;
    Ok(stmt)
}

/// Fetches single columns of single records and compares them to the dataset.
///
/// One statement is prepared per column up front, each request executes the statement of its
/// column. A request for a field outside the schema fails with [`StoreError::Bind`].
pub fn lookup(
    conn: &mut dyn Connection,
    dataset: &Dataset,
    schema: &Schema,
    lookups: &[Lookup],
) -> BenchResult<Throughput> {
    let conn = &*conn;
    let mut statements = (0..schema.field_count())
        .map(|field| prepare_lookup(conn, schema, field, dataset.field_width()))
        .collect::<BenchResult<Vec<_>>>()?;

    let mut bytes = 0;
    let elapsed = try_measure(|| {
        for &Lookup { key, field } in lookups {
            let stmt = statements.get_mut(field).ok_or_else(|| {
                StoreError::Bind(format!("no lookup statement for field{field}"))
            })?;
            stmt.bind_params(&[Value::try_from(key)?])?;
            stmt.execute()?;

            if !stmt.fetch_next()? {
                return Err(ValidationError::MissingRecord { key }.into());
            }

            let actual = stmt.column(0).and_then(Value::as_bytes);
            match (actual, dataset.lookup(key, field)) {
                (Some(actual), Some(expected)) if actual == expected => {
                    bytes += actual.len() as u64;
                }
                _ => return Err(ValidationError::Mismatch { key, field }.into()),
            }
        }
        Ok::<_, BenchError>(())
    })?;

    for stmt in &mut statements {
        stmt.close()?;
    }

    Ok(Throughput {
        operations: lookups.len() as u64,
        bytes,
        elapsed,
    })
}

/// Reads every column of every record in key order.
pub fn scan(conn: &mut dyn Connection, dataset: &Dataset, schema: &Schema) -> BenchResult<Throughput> {
    let sql = schema.scan_all();
    let mut rows_read = 0;
    let mut bytes = 0;

    let elapsed = try_measure(|| {
        let mut rows = conn.query(&sql)?;

        let columns = rows.column_count();
        if columns != schema.field_count() {
            return Err(ValidationError::FieldCount {
                expected: schema.field_count(),
                actual: columns,
            }
            .into());
        }

        while let Some(row) = rows.fetch_row()? {
            rows_read += 1;
            bytes += row.iter().map(Value::payload_len).sum::<usize>() as u64;
        }
        Ok::<_, BenchError>(())
    })?;

    if rows_read != dataset.len() {
        tracing::warn!(
            expected = dataset.len(),
            actual = rows_read,
            "scan returned an unexpected number of rows"
        );
    }

    Ok(Throughput {
        operations: rows_read,
        bytes,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlbench_store::{BoxedConnection, ConnectTarget, Connector, MemoryConnector, Transport};
    use sqlbench_workload::DatasetParams;

    use super::*;

    fn setup() -> (Arc<Dataset>, Schema) {
        sqlbench_test::tracing::init();

        let dataset = Dataset::build(DatasetParams {
            tuple_count: 200,
            field_count: 4,
            field_width: 16,
            seed: 42,
        })
        .unwrap();
        let schema = Schema::for_dataset("usertable", &dataset);
        (Arc::new(dataset), schema)
    }

    fn connect(connector: &MemoryConnector) -> BoxedConnection {
        connector
            .connect(Transport::Tcp, &ConnectTarget::new("user", "password"))
            .unwrap()
    }

    #[test]
    fn small_query_counts_iterations() {
        let (dataset, schema) = setup();
        let connector = MemoryConnector::new(dataset, schema);
        let mut conn = connect(&connector);

        let throughput = small_query(conn.as_mut(), 500).unwrap();
        assert_eq!(throughput.operations, 500);
        assert!(throughput.elapsed > 0.0);
    }

    #[test]
    fn prepared_releases_statement() {
        let (dataset, schema) = setup();
        let connector = MemoryConnector::new(dataset, schema);
        let mut conn = connect(&connector);

        let throughput = prepared(conn.as_mut(), 500).unwrap();
        assert_eq!(throughput.operations, 500);
        assert_eq!(connector.open_statements(), 0);
    }

    #[test]
    fn lookup_validates_against_dataset() {
        let (dataset, schema) = setup();
        let lookups = generate_lookups(&dataset, 0.99, 7, 1000).unwrap();
        let connector = MemoryConnector::new(Arc::clone(&dataset), schema.clone());
        let mut conn = connect(&connector);

        let throughput = lookup(conn.as_mut(), &dataset, &schema, &lookups).unwrap();
        assert_eq!(throughput.operations, 1000);
        assert_eq!(throughput.bytes, 1000 * 16);
        assert_eq!(connector.open_statements(), 0);
    }

    #[test]
    fn lookup_detects_corruption() {
        let (dataset, schema) = setup();
        let lookups = generate_lookups(&dataset, 0.99, 7, 1000).unwrap();
        let hot = lookups[0];
        let connector = MemoryConnector::new(Arc::clone(&dataset), schema.clone())
            .corrupt(hot.key, hot.field);
        let mut conn = connect(&connector);

        let error = lookup(conn.as_mut(), &dataset, &schema, &lookups).unwrap_err();
        assert!(matches!(
            error,
            BenchError::Validation(ValidationError::Mismatch { key, field })
                if key == hot.key && field == hot.field
        ));
        assert_eq!(connector.open_statements(), 0);
    }

    #[test]
    fn lookup_reports_missing_record() {
        let (dataset, schema) = setup();
        let connector = MemoryConnector::new(Arc::clone(&dataset), schema.clone());
        let mut conn = connect(&connector);

        let lookups = [Lookup {
            key: dataset.len(),
            field: 0,
        }];
        let error = lookup(conn.as_mut(), &dataset, &schema, &lookups).unwrap_err();
        assert!(matches!(
            error,
            BenchError::Validation(ValidationError::MissingRecord { .. })
        ));
    }

    #[test]
    fn lookup_rejects_unknown_field() {
        let (dataset, schema) = setup();
        let connector = MemoryConnector::new(Arc::clone(&dataset), schema.clone());
        let mut conn = connect(&connector);

        let lookups = [Lookup {
            key: 0,
            field: schema.field_count(),
        }];
        let error = lookup(conn.as_mut(), &dataset, &schema, &lookups).unwrap_err();
        assert!(matches!(error, BenchError::Store(StoreError::Bind(_))));
        assert_eq!(connector.open_statements(), 0);
    }

    #[test]
    fn scan_reads_whole_table() {
        let (dataset, schema) = setup();
        let connector = MemoryConnector::new(Arc::clone(&dataset), schema.clone());
        let mut conn = connect(&connector);

        let throughput = scan(conn.as_mut(), &dataset, &schema).unwrap();
        assert_eq!(throughput.operations, 200);
        assert_eq!(throughput.bytes, dataset.total_bytes());
    }

    #[test]
    fn lookups_are_reproducible() {
        let (dataset, _) = setup();

        let a = generate_lookups(&dataset, 0.99, 3, 100).unwrap();
        let b = generate_lookups(&dataset, 0.99, 3, 100).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|lookup| lookup.key < 200 && lookup.field < 4));
    }

    #[test]
    fn runs_by_kind() {
        let (dataset, schema) = setup();
        let connector = MemoryConnector::new(Arc::clone(&dataset), schema.clone());
        let mut conn = connect(&connector);
        let ctx = DriverContext {
            dataset: &dataset,
            schema: &schema,
            small_tx_iterations: 10,
            lookups: &[],
        };

        for kind in DriverKind::ALL {
            let report = run_driver(kind, conn.as_mut(), &ctx).unwrap();
            assert_eq!(report.kind, kind);
        }
    }
}
