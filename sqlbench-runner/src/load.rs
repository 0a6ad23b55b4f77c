//! Loading the dataset into the benchmark table.

use sqlbench_store::Connection;
use sqlbench_workload::{Dataset, Schema, Throughput, try_measure};

use crate::error::{BenchError, BenchResult};

/// Number of progress checkpoints logged while loading.
const CHECKPOINTS: u64 = 10;

/// Returns the percentages of progress reached when going from `before` to `after` of `total`
/// loaded records.
///
/// Every checkpoint is reported exactly once over a load, even if a single batch crosses several
/// of them.
fn crossed_checkpoints(before: u64, after: u64, total: u64) -> impl Iterator<Item = u64> {
    (1..=CHECKPOINTS)
        .filter(move |&checkpoint| {
            let threshold = total * checkpoint;
            before * CHECKPOINTS < threshold && threshold <= after * CHECKPOINTS
        })
        .map(|checkpoint| checkpoint * 100 / CHECKPOINTS)
}

/// Recreates the benchmark table and inserts every record of `dataset`.
///
/// Records are inserted in ascending key order with `batch_size` records per statement. Progress
/// is logged every tenth of the dataset. The returned throughput counts inserted records and
/// their payload bytes, the time spent on DDL is not included.
pub fn load_dataset(
    conn: &mut dyn Connection,
    dataset: &Dataset,
    schema: &Schema,
    batch_size: usize,
) -> BenchResult<Throughput> {
    conn.execute(&schema.drop_table())?;
    conn.execute(&schema.create_table())?;

    let total = dataset.len();
    let mut loaded = 0;

    let elapsed = try_measure(|| {
        for keys in dataset.key_batches(batch_size) {
            let records = keys.clone().filter_map(|key| dataset.record(key));
            if let Some(sql) = schema.insert_batch(records) {
                conn.execute(&sql)?;
            }

            for percent in crossed_checkpoints(loaded, keys.end, total) {
                tracing::info!(rows = keys.end, total, "loaded {percent}% of the dataset");
            }
            loaded = keys.end;
        }
        Ok::<_, BenchError>(())
    })?;

    Ok(Throughput {
        operations: loaded,
        bytes: loaded * dataset.record_bytes() as u64,
        elapsed,
    })
}
