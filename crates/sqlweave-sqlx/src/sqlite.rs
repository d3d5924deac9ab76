//! SQLite driver.

use std::collections::BTreeMap;
use std::str::FromStr;

use sqlweave_core::{
    Driver, DriverError, Execution, IndexOrigin, LiveColumn, LiveIndex, ParameterSet,
    PlaceholderStyle, PreparedStatement, Row, SqlValue,
};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};
use tracing::{debug, info, trace};

use crate::runtime::{driver_error, is_insert, returns_rows, BlockingRuntime};

/// Blocking SQLite driver.
///
/// The pool holds a single connection, which keeps `sqlite::memory:`
/// databases alive and makes the last insert id unambiguous.
#[derive(Debug)]
pub struct SqliteDriver {
    runtime: BlockingRuntime,
    pool: SqlitePool,
}

impl SqliteDriver {
    /// Opens the database at `url`, creating the file if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Connection`] if the url is invalid or the
    /// database cannot be opened.
    pub fn connect(url: &str) -> Result<Self, DriverError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(driver_error)?
            .create_if_missing(true);
        let runtime = BlockingRuntime::new()?;
        let pool = runtime
            .block_on(
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options),
            )
            .map_err(|err| DriverError::Connection(err.to_string()))?;
        info!(url, "Connected to SQLite");
        Ok(Self { runtime, pool })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// See [`SqliteDriver::connect`].
    pub fn in_memory() -> Result<Self, DriverError> {
        Self::connect("sqlite::memory:")
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn fetch_metadata(&self, sql: &str, table: &str) -> Result<Vec<SqliteRow>, DriverError> {
        self.runtime
            .block_on(sqlx::query(sql).bind(table.to_string()).fetch_all(&self.pool))
            .map_err(|err| DriverError::Introspection {
                table: table.to_string(),
                message: err.to_string(),
            })
    }
}

impl Driver for SqliteDriver {
    type Statement = PreparedStatement;

    fn prepare(&self, sql: &str) -> Result<PreparedStatement, DriverError> {
        Ok(PreparedStatement::positional(sql, PlaceholderStyle::Question))
    }

    fn execute(
        &self,
        statement: &PreparedStatement,
        params: &ParameterSet,
    ) -> Result<Execution, DriverError> {
        let values = statement.resolve(params)?;
        let mut query = sqlx::query(statement.sql());
        for value in values {
            query = bind_value(query, value);
        }
        trace!(sql = statement.sql(), "Sending statement to SQLite");

        if returns_rows(statement.sql()) {
            let rows = self
                .runtime
                .block_on(query.fetch_all(&self.pool))
                .map_err(driver_error)?;
            let rows: Vec<Row> = rows.iter().map(decode_row).collect();
            let rows_affected = if is_insert(statement.sql()) { rows.len() as u64 } else { 0 };
            return Ok(Execution {
                rows_affected,
                rows,
                last_insert_id: None,
            });
        }

        let result = self
            .runtime
            .block_on(query.execute(&self.pool))
            .map_err(driver_error)?;
        debug!(rows_affected = result.rows_affected(), "SQLite statement done");
        Ok(Execution {
            rows_affected: result.rows_affected(),
            rows: Vec::new(),
            last_insert_id: is_insert(statement.sql()).then(|| result.last_insert_rowid()),
        })
    }

    fn table_exists(&self, table: &str) -> Result<bool, DriverError> {
        let rows = self.fetch_metadata(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            table,
        )?;
        Ok(!rows.is_empty())
    }

    fn introspect_columns(&self, table: &str) -> Result<Vec<LiveColumn>, DriverError> {
        let rows = self.fetch_metadata(
            "SELECT name, type FROM pragma_table_info(?) ORDER BY cid",
            table,
        )?;
        Ok(rows
            .iter()
            .map(|row| {
                let name: String = row.try_get("name").unwrap_or_default();
                let reported: String = row.try_get("type").unwrap_or_default();
                LiveColumn::new(name, reported.to_ascii_lowercase())
            })
            .collect())
    }

    // `origin` is `pk` for the primary key, `u` for a UNIQUE constraint and
    // `c` for CREATE INDEX.
    fn introspect_indexes(&self, table: &str) -> Result<BTreeMap<String, LiveIndex>, DriverError> {
        let rows = self.fetch_metadata(
            "SELECT name, \"unique\" AS is_unique, origin FROM pragma_index_list(?)",
            table,
        )?;
        let mut indexes = BTreeMap::new();
        for row in &rows {
            let name: String = row.try_get("name").unwrap_or_default();
            let columns: Vec<String> = self
                .fetch_metadata("SELECT name FROM pragma_index_info(?) ORDER BY seqno", &name)?
                .iter()
                .filter_map(|column| column.try_get::<String, _>("name").ok())
                .collect();
            let mut index = LiveIndex::new(columns);
            if row.try_get::<i64, _>("is_unique").unwrap_or(0) != 0 {
                index = index.unique();
            }
            index = match row.try_get::<String, _>("origin").as_deref() {
                Ok("pk") => index.origin(IndexOrigin::PrimaryKey),
                Ok("u") => index.origin(IndexOrigin::Constraint),
                _ => index,
            };
            indexes.insert(name, index);
        }
        Ok(indexes)
    }
}

impl Drop for SqliteDriver {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_value<'q>(query: SqliteQuery<'q>, value: &SqlValue) -> SqliteQuery<'q> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(n) => query.bind(*n),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Blob(bytes) => query.bind(bytes.clone()),
        SqlValue::Json(json) => query.bind(json.to_string()),
    }
}

// SQLite is dynamically typed: decode by the storage class of each value,
// not by the declared column type.
fn decode_row(row: &SqliteRow) -> Row {
    let mut out = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        out.insert(column.name(), decode_value(row, index));
    }
    out
}

fn decode_value(row: &SqliteRow, index: usize) -> SqlValue {
    let Ok(raw) = row.try_get_raw(index) else {
        return SqlValue::Null;
    };
    if raw.is_null() {
        return SqlValue::Null;
    }
    let storage = raw.type_info().name().to_ascii_uppercase();
    match storage.as_str() {
        "INTEGER" | "INT" | "INT8" | "BIGINT" => row
            .try_get_unchecked::<i64, _>(index)
            .map_or(SqlValue::Null, SqlValue::Int),
        "BOOLEAN" => row
            .try_get_unchecked::<bool, _>(index)
            .map_or(SqlValue::Null, SqlValue::Bool),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => row
            .try_get_unchecked::<f64, _>(index)
            .map_or(SqlValue::Null, SqlValue::Float),
        "BLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map_or(SqlValue::Null, SqlValue::Blob),
        _ => row
            .try_get_unchecked::<String, _>(index)
            .map_or(SqlValue::Null, SqlValue::Text),
    }
}
