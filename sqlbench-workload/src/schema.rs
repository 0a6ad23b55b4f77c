//! Table layout and statement texts for the benchmark table.
//!
//! The table follows the YCSB layout: one integer key column followed by `field0..fieldN` fixed
//! width character columns. Columns wider than [`MAX_CHAR_WIDTH`] are declared `VARCHAR`.

use std::fmt::Write;

use crate::dataset::{Dataset, Record};

/// The table name used when none is configured.
pub const DEFAULT_TABLE: &str = "usertable";

/// The name of the key column.
pub const KEY_COLUMN: &str = "ycsb_key";

/// The trivial round-trip query used by the small query drivers.
pub const SELECT_ONE: &str = "SELECT 1";

/// The value returned by [`SELECT_ONE`].
pub const SELECT_ONE_VALUE: i64 = 1;

/// The widest column MySQL accepts as `CHAR`.
pub const MAX_CHAR_WIDTH: usize = 255;

/// Layout of the benchmark table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    table: String,
    field_count: usize,
    field_width: usize,
}

impl Schema {
    /// Creates a schema for a table with `field_count` columns of `field_width` bytes.
    pub fn new(table: impl Into<String>, field_count: usize, field_width: usize) -> Self {
        Self {
            table: table.into(),
            field_count,
            field_width,
        }
    }

    /// Creates the schema matching the layout of `dataset`.
    pub fn for_dataset(table: impl Into<String>, dataset: &Dataset) -> Self {
        Self::new(table, dataset.field_count(), dataset.field_width())
    }

    /// The table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The number of payload columns.
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// The name of the payload column at `index`.
    pub fn field_name(index: usize) -> String {
        format!("field{index}")
    }

    /// Statement dropping the table if it exists.
    pub fn drop_table(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table)
    }

    /// Statement creating the table.
    pub fn create_table(&self) -> String {
        let column_type = if self.field_width <= MAX_CHAR_WIDTH {
            "CHAR"
        } else {
            "VARCHAR"
        };

        let mut sql = format!(
            "CREATE TABLE {} ({KEY_COLUMN} BIGINT UNSIGNED NOT NULL PRIMARY KEY",
            self.table
        );
        for index in 0..self.field_count {
            write!(
                sql,
                ", field{index} {column_type}({}) NOT NULL",
                self.field_width
            )
            .ok();
        }
        sql.push(')');
        sql
    }

    /// A multi-row insert statement for the given records.
    ///
    /// Returns `None` if `records` is empty. Field contents are alphanumeric, so they are inlined
    /// as literals without escaping.
    pub fn insert_batch<'a>(&self, records: impl IntoIterator<Item = Record<'a>>) -> Option<String> {
        let mut records = records.into_iter().peekable();
        records.peek()?;

        let mut sql = format!("INSERT INTO {} ({KEY_COLUMN}", self.table);
        for index in 0..self.field_count {
            write!(sql, ", field{index}").ok();
        }
        sql.push_str(") VALUES ");

        for (row, record) in records.enumerate() {
            if row > 0 {
                sql.push(',');
            }
            write!(sql, "({}", record.key()).ok();
            for field in record.fields() {
                sql.push_str(",'");
                sql.push_str(&String::from_utf8_lossy(field));
                sql.push('\'');
            }
            sql.push(')');
        }

        Some(sql)
    }

    /// Prepared statement selecting a single column of one record by key.
    pub fn select_field(&self, index: usize) -> String {
        format!(
            "SELECT field{index} FROM {} WHERE {KEY_COLUMN} = ?",
            self.table
        )
    }

    /// Query returning the payload columns of every record in key order.
    pub fn scan_all(&self) -> String {
        let columns: Vec<_> = (0..self.field_count).map(Self::field_name).collect();
        format!(
            "SELECT {} FROM {} ORDER BY {KEY_COLUMN}",
            columns.join(", "),
            self.table
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::dataset::DatasetParams;

    use super::*;

    #[test]
    fn create_table() {
        let schema = Schema::new("t", 2, 20);
        assert_eq!(
            schema.create_table(),
            "CREATE TABLE t (ycsb_key BIGINT UNSIGNED NOT NULL PRIMARY KEY, \
             field0 CHAR(20) NOT NULL, field1 CHAR(20) NOT NULL)"
        );
        assert_eq!(schema.drop_table(), "DROP TABLE IF EXISTS t");
    }

    #[test]
    fn wide_columns_are_varchar() {
        let schema = Schema::new("t", 1, MAX_CHAR_WIDTH);
        assert!(schema.create_table().contains("field0 CHAR(255) NOT NULL"));

        let schema = Schema::new("t", 1, MAX_CHAR_WIDTH + 1);
        assert!(schema.create_table().contains("field0 VARCHAR(256) NOT NULL"));
    }

    #[test]
    fn insert_batch() {
        let dataset = Dataset::build(DatasetParams {
            tuple_count: 2,
            field_count: 2,
            field_width: 3,
            seed: 1,
        })
        .unwrap();
        let schema = Schema::for_dataset("t", &dataset);

        let sql = schema.insert_batch(dataset.iter()).unwrap();
        let field = |key, index| {
            String::from_utf8(dataset.lookup(key, index).unwrap().to_vec()).unwrap()
        };
        assert_eq!(
            sql,
            format!(
                "INSERT INTO t (ycsb_key, field0, field1) VALUES (0,'{}','{}'),(1,'{}','{}')",
                field(0, 0),
                field(0, 1),
                field(1, 0),
                field(1, 1),
            )
        );

        assert_eq!(schema.insert_batch(dataset.iter().take(0)), None);
    }

    #[test]
    fn queries() {
        let schema = Schema::new(DEFAULT_TABLE, 3, 10);
        assert_eq!(
            schema.select_field(2),
            "SELECT field2 FROM usertable WHERE ycsb_key = ?"
        );
        assert_eq!(
            schema.scan_all(),
            "SELECT field0, field1, field2 FROM usertable ORDER BY ycsb_key"
        );
    }
}
