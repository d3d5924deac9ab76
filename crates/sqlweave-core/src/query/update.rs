//! UPDATE and batch UPDATE.

use tracing::{debug, trace};

use super::{QueryBuilder, DEFAULT_CHUNK_SIZE};
use crate::dialect::coerce_for_column;
use crate::driver::Driver;
use crate::error::{QueryError, Result};
use crate::params::ParameterSet;
use crate::value::{SqlValue, Values};

/// Right-hand side of one `SET` assignment.
#[derive(Debug, Clone, PartialEq)]
enum SetValue {
    /// Bound value.
    Value(SqlValue),
    /// SQL expression emitted verbatim, such as a column's `on_update`.
    Expression(String),
}

impl<D: Driver> QueryBuilder<'_, D> {
    /// Updates the rows matching the accumulated conditions and returns the
    /// number of affected rows.
    ///
    /// On dialects without an `ON UPDATE` column attribute, schema columns
    /// that declare `on_update` and are absent from `values` are set to that
    /// expression.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyValues`] when `values` is empty, or the
    /// driver error.
    pub fn update(&mut self, values: &Values) -> Result<u64> {
        let clauses = self.take_clauses();
        if values.is_empty() {
            return Err(QueryError::EmptyValues);
        }

        let mut assignments: Vec<(String, SetValue)> = values
            .iter()
            .map(|(column, value)| (column.to_string(), SetValue::Value(value.clone())))
            .collect();
        if self.dialect.auto_populates_on_update() {
            for (column, def) in self.schema.iter() {
                let expression = def.on_update.trim();
                if !expression.is_empty() && !values.contains(column) {
                    let expression = SetValue::Expression(expression.to_string());
                    assignments.push((column.to_string(), expression));
                }
            }
        }

        let set = self.render_assignments(&assignments);
        let mut sql = format!("UPDATE {} SET {set}", self.quoted_table());
        sql.push_str(&self.render_where(&clauses));
        let params = self.binder.take();
        Ok(self.dispatch(&sql, &params)?.rows_affected)
    }

    /// Updates each row by its first column, which identifies the row; the
    /// remaining columns are assigned.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::batch_update_chunked`].
    pub fn batch_update(&mut self, rows: &[Values]) -> Result<u64> {
        self.batch_update_chunked(None, rows, DEFAULT_CHUNK_SIZE)
    }

    /// Updates each row by the explicit `key` column; every other column of
    /// the row is assigned.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::batch_update_chunked`].
    pub fn batch_update_by(&mut self, key: &str, rows: &[Values]) -> Result<u64> {
        self.batch_update_chunked(Some(key), rows, DEFAULT_CHUNK_SIZE)
    }

    /// Runs one `UPDATE … WHERE key = …` per row, `chunk_size` rows at a
    /// time. Without `key` the first column of each row is the key.
    ///
    /// Rows lacking the key or any column to assign are skipped. Accumulated
    /// clauses are discarded. Returns the total number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyValues`] when `rows` is empty, or the
    /// error of the first failing statement.
    pub fn batch_update_chunked(
        &mut self,
        key: Option<&str>,
        rows: &[Values],
        chunk_size: usize,
    ) -> Result<u64> {
        drop(self.take_clauses());
        if rows.is_empty() {
            return Err(QueryError::EmptyValues);
        }

        let mut affected = 0;
        for (chunk_index, chunk) in rows.chunks(chunk_size.max(1)).enumerate() {
            for row in chunk {
                let Some((sql, params)) = self.render_keyed_update(key, row) else {
                    trace!(table = %self.table, "Skipping batch row without key or values");
                    continue;
                };
                affected += self.dispatch(&sql, &params)?.rows_affected;
            }
            debug!(
                table = %self.table,
                chunk = chunk_index,
                rows = chunk.len(),
                "Updated batch chunk"
            );
        }
        Ok(affected)
    }

    fn render_keyed_update(
        &mut self,
        key: Option<&str>,
        row: &Values,
    ) -> Option<(String, ParameterSet)> {
        let (key_column, key_value) = match key {
            Some(key) => (key, row.get(key)?),
            None => row.first()?,
        };
        let assignments: Vec<(String, SetValue)> = row
            .iter()
            .filter(|(column, _)| *column != key_column)
            .map(|(column, value)| (column.to_string(), SetValue::Value(value.clone())))
            .collect();
        if assignments.is_empty() {
            return None;
        }

        let set = self.render_assignments(&assignments);
        let key_value =
            coerce_for_column(self.dialect, &self.schema, key_column, key_value.clone());
        let placeholder = self.binder.bind("where", key_column, key_value);
        let sql = format!(
            "UPDATE {} SET {set} WHERE {} = {placeholder}",
            self.quoted_table(),
            self.dialect.quote_identifier(key_column)
        );
        Some((sql, self.binder.take()))
    }

    fn render_assignments(&mut self, assignments: &[(String, SetValue)]) -> String {
        assignments
            .iter()
            .map(|(column, value)| {
                let rhs = match value {
                    SetValue::Value(value) => {
                        let value =
                            coerce_for_column(self.dialect, &self.schema, column, value.clone());
                        self.binder.bind("set", column, value)
                    }
                    SetValue::Expression(expression) => expression.clone(),
                };
                format!("{} = {rhs}", self.dialect.quote_identifier(column))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
