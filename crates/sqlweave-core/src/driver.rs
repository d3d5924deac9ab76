//! The database boundary.
//!
//! Connection handling, transport and introspection live behind
//! [`Driver`]. The core only produces SQL text and parameter sets.

use std::collections::BTreeMap;

use crate::error::DriverError;
use crate::params::ParameterSet;
use crate::value::Row;

/// Outcome of one executed statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Execution {
    /// Rows changed by the statement.
    pub rows_affected: u64,
    /// Rows returned by the statement.
    pub rows: Vec<Row>,
    /// Key generated by an `INSERT`, read on the same connection that ran
    /// the statement.
    pub last_insert_id: Option<i64>,
}

impl Execution {
    /// Creates an execution that changed `rows_affected` rows.
    #[must_use]
    pub const fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            rows: Vec::new(),
            last_insert_id: None,
        }
    }

    /// Creates an execution that returned `rows`.
    #[must_use]
    pub const fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows_affected: 0,
            rows,
            last_insert_id: None,
        }
    }
}

/// A column as reported by introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveColumn {
    /// Column name.
    pub name: String,
    /// Type as the backend reports it, e.g. `int(11) unsigned`.
    pub reported_type: String,
}

impl LiveColumn {
    /// Creates a live column.
    #[must_use]
    pub fn new(name: impl Into<String>, reported_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reported_type: reported_type.into(),
        }
    }
}

/// Where a live index comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexOrigin {
    /// Backs the primary key.
    PrimaryKey,
    /// Backs a `UNIQUE` table constraint.
    Constraint,
    /// Created on its own.
    #[default]
    Index,
}

/// An index as reported by introspection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveIndex {
    /// Indexed columns in key order.
    pub columns: Vec<String>,
    /// Unique index.
    pub unique: bool,
    /// How the index was created.
    pub origin: IndexOrigin,
}

impl LiveIndex {
    /// Creates a plain index over `columns`.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
            origin: IndexOrigin::Index,
        }
    }

    /// Marks the index unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets where the index comes from. Primary key and constraint indexes
    /// are unique.
    #[must_use]
    pub const fn origin(mut self, origin: IndexOrigin) -> Self {
        if !matches!(origin, IndexOrigin::Index) {
            self.unique = true;
        }
        self.origin = origin;
        self
    }

    /// Returns `true` if the index is exactly `column` with the given
    /// uniqueness.
    #[must_use]
    pub fn covers(&self, column: &str, unique: bool) -> bool {
        self.unique == unique && self.columns.len() == 1 && self.columns[0] == column
    }
}

/// Synchronous database driver.
///
/// Implementations bind parameters themselves; the SQL they receive uses
/// `:name` placeholders (see
/// [`PreparedStatement`](crate::params::PreparedStatement) for positional
/// rewriting).
pub trait Driver {
    /// Driver-specific prepared statement.
    type Statement;

    /// Prepares `sql` for execution.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared.
    fn prepare(&self, sql: &str) -> Result<Self::Statement, DriverError>;

    /// Executes a prepared statement with `params`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database rejects the statement or a
    /// placeholder has no bound value.
    fn execute(
        &self,
        statement: &Self::Statement,
        params: &ParameterSet,
    ) -> Result<Execution, DriverError>;

    /// Returns `true` if `table` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if introspection fails.
    fn table_exists(&self, table: &str) -> Result<bool, DriverError>;

    /// Lists the columns of `table` in ordinal order.
    ///
    /// # Errors
    ///
    /// Returns an error if introspection fails.
    fn introspect_columns(&self, table: &str) -> Result<Vec<LiveColumn>, DriverError>;

    /// Lists the indexes of `table` by name.
    ///
    /// # Errors
    ///
    /// Returns an error if introspection fails.
    fn introspect_indexes(&self, table: &str) -> Result<BTreeMap<String, LiveIndex>, DriverError>;

    /// Prepares and executes `sql` in one call.
    ///
    /// # Errors
    ///
    /// See [`Driver::prepare`] and [`Driver::execute`].
    fn run(&self, sql: &str, params: &ParameterSet) -> Result<Execution, DriverError> {
        let statement = self.prepare(sql)?;
        self.execute(&statement, params)
    }
}

impl<D: Driver + ?Sized> Driver for &D {
    type Statement = D::Statement;

    fn prepare(&self, sql: &str) -> Result<Self::Statement, DriverError> {
        (**self).prepare(sql)
    }

    fn execute(
        &self,
        statement: &Self::Statement,
        params: &ParameterSet,
    ) -> Result<Execution, DriverError> {
        (**self).execute(statement, params)
    }

    fn table_exists(&self, table: &str) -> Result<bool, DriverError> {
        (**self).table_exists(table)
    }

    fn introspect_columns(&self, table: &str) -> Result<Vec<LiveColumn>, DriverError> {
        (**self).introspect_columns(table)
    }

    fn introspect_indexes(&self, table: &str) -> Result<BTreeMap<String, LiveIndex>, DriverError> {
        (**self).introspect_indexes(table)
    }
}
