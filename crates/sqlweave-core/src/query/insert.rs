//! INSERT and batch INSERT.

use tracing::debug;

use super::select::coerce_row;
use super::{QueryBuilder, DEFAULT_CHUNK_SIZE};
use crate::dialect::coerce_for_column;
use crate::driver::Driver;
use crate::error::{QueryError, Result};
use crate::value::{SqlValue, Values};

impl<D: Driver> QueryBuilder<'_, D> {
    /// Inserts one row and returns its generated key.
    ///
    /// The key is read back with `RETURNING` where the dialect supports it
    /// and the schema declares a primary key, and from the driver's last
    /// insert id otherwise. [`SqlValue::Null`] when neither is available.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyValues`] when `values` is empty, or the
    /// driver error.
    pub fn insert(&mut self, values: &Values) -> Result<SqlValue> {
        drop(self.take_clauses());
        if values.is_empty() {
            return Err(QueryError::EmptyValues);
        }

        let mut columns = Vec::with_capacity(values.len());
        let mut placeholders = Vec::with_capacity(values.len());
        for (column, value) in values.iter() {
            let value = coerce_for_column(self.dialect, &self.schema, column, value.clone());
            columns.push(self.dialect.quote_identifier(column));
            placeholders.push(self.binder.bind("ins", column, value));
        }
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quoted_table(),
            columns.join(","),
            placeholders.join(",")
        );
        let primary_key = self.schema.primary_key().map(str::to_string);
        let returning = primary_key
            .as_deref()
            .and_then(|pk| self.dialect.insert_returning_clause(pk));
        if let Some(clause) = &returning {
            sql.push_str(clause);
        }

        let params = self.binder.take();
        let execution = self.dispatch(&sql, &params)?;

        if let (Some(pk), Some(_)) = (primary_key.as_deref(), &returning) {
            if let Some(row) = execution.rows.into_iter().next() {
                let row = coerce_row(&self.schema, row);
                if let Some(id) = row.get(pk) {
                    return Ok(id.clone());
                }
            }
        }
        Ok(execution.last_insert_id.map_or(SqlValue::Null, SqlValue::Int))
    }

    /// Inserts `rows` in statements of at most 1000 rows.
    ///
    /// See [`QueryBuilder::batch_insert_chunked`].
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::batch_insert_chunked`].
    pub fn batch_insert(&mut self, columns: &[&str], rows: &[Values]) -> Result<u64> {
        self.batch_insert_chunked(columns, rows, DEFAULT_CHUNK_SIZE)
    }

    /// Inserts `rows` into `columns`, `chunk_size` rows per statement.
    ///
    /// Columns a row does not carry are bound as NULL; extra row entries are
    /// ignored. Stops at the first failing statement, so earlier chunks stay
    /// written. Returns the total number of inserted rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyValues`] when `columns` or `rows` is
    /// empty, or the error of the first failing statement.
    pub fn batch_insert_chunked(
        &mut self,
        columns: &[&str],
        rows: &[Values],
        chunk_size: usize,
    ) -> Result<u64> {
        drop(self.take_clauses());
        if columns.is_empty() || rows.is_empty() {
            return Err(QueryError::EmptyValues);
        }

        let chunk_size = chunk_size.max(1);
        let column_list = columns
            .iter()
            .map(|column| self.dialect.quote_identifier(column))
            .collect::<Vec<_>>()
            .join(",");
        let head = format!("INSERT INTO {} ({column_list}) VALUES ", self.quoted_table());

        let mut inserted = 0;
        for (chunk_index, chunk) in rows.chunks(chunk_size).enumerate() {
            let mut tuples = Vec::with_capacity(chunk.len());
            for (offset, row) in chunk.iter().enumerate() {
                let row_index = chunk_index * chunk_size + offset;
                let placeholders: Vec<String> = columns
                    .iter()
                    .map(|column| {
                        let value = row.get(column).cloned().unwrap_or(SqlValue::Null);
                        let value = coerce_for_column(self.dialect, &self.schema, column, value);
                        self.binder.bind_row(row_index, column, value)
                    })
                    .collect();
                tuples.push(format!("({})", placeholders.join(",")));
            }
            let sql = format!("{head}{}", tuples.join(","));
            let params = self.binder.take();
            let execution = self.dispatch(&sql, &params)?;
            debug!(
                table = %self.table,
                chunk = chunk_index,
                rows = chunk.len(),
                "Inserted batch chunk"
            );
            inserted += execution.rows_affected;
        }
        Ok(inserted)
    }
}
