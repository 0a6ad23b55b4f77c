use std::collections::VecDeque;

use crate::backend::Row;
use crate::error::{StoreError, StoreResult};
use crate::value::{ColumnType, Value};

/// Client-side buffers of a prepared statement.
///
/// Results are stored in full on `execute` and handed out row by row, so the statement does not
/// hold on to a server cursor between fetches.
#[derive(Debug)]
pub(crate) struct StatementBuffers {
    param_count: usize,
    column_count: usize,
    params: Vec<Value>,
    results: Option<Vec<ColumnType>>,
    rows: VecDeque<Row>,
    current: Row,
}

impl StatementBuffers {
    pub fn new(param_count: usize, column_count: usize) -> Self {
        Self {
            param_count,
            column_count,
            params: Vec::with_capacity(param_count),
            results: None,
            rows: VecDeque::new(),
            current: Vec::with_capacity(column_count),
        }
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn bind_params(&mut self, params: &[Value]) -> StoreResult<()> {
        if params.len() != self.param_count {
            return Err(StoreError::Bind(format!(
                "statement takes {} parameters, got {}",
                self.param_count,
                params.len()
            )));
        }

        self.params.clear();
        self.params.extend_from_slice(params);
        Ok(())
    }

    pub fn bind_results(&mut self, columns: &[ColumnType]) -> StoreResult<()> {
        if columns.len() != self.column_count {
            return Err(StoreError::Bind(format!(
                "statement returns {} columns, got {} result buffers",
                self.column_count,
                columns.len()
            )));
        }

        self.results = Some(columns.to_vec());
        Ok(())
    }

    /// Returns the bound parameters, failing if they have not been bound yet.
    pub fn params(&self) -> StoreResult<&[Value]> {
        if self.params.len() != self.param_count {
            return Err(StoreError::Bind("parameters have not been bound".into()));
        }
        Ok(&self.params)
    }

    /// Replaces the buffered result set.
    pub fn store(&mut self, rows: impl IntoIterator<Item = Row>) {
        self.rows.clear();
        self.rows.extend(rows);
        self.current.clear();
    }

    pub fn fetch_next(&mut self) -> StoreResult<bool> {
        self.current.clear();
        let Some(row) = self.rows.pop_front() else {
            return Ok(false);
        };

        if row.len() != self.column_count {
            return Err(StoreError::Fetch(format!(
                "expected {} columns, got {}",
                self.column_count,
                row.len()
            )));
        }

        match &self.results {
            Some(types) => {
                for (value, column) in row.into_iter().zip(types) {
                    self.current.push(column.coerce(value)?);
                }
            }
            None => self.current = row,
        }

        Ok(true)
    }

    pub fn column(&self, index: usize) -> Option<&Value> {
        self.current.get(index)
    }
}
