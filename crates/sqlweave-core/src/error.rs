//! Error types.

use thiserror::Error;

/// Errors reported by a [`Driver`](crate::driver::Driver).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The driver could not reach the database.
    #[error("connection error: {0}")]
    Connection(String),

    /// The database rejected a statement.
    #[error("execution error: {0}")]
    Execution(String),

    /// Reading the live structure of a table failed.
    #[error("introspection of '{table}' failed: {message}")]
    Introspection {
        /// Table being introspected.
        table: String,
        /// Driver diagnostic.
        message: String,
    },

    /// A statement references a placeholder with no bound value.
    #[error("no value bound for placeholder :{0}")]
    MissingParameter(String),
}

/// Errors raised while registering or loading table schemas.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The table was never registered.
    #[error("table '{0}' is not registered")]
    NotRegistered(String),

    /// `auto_increment` was set on a non-integer column.
    #[error(
        "column '{table}.{column}' is auto_increment but its type '{column_type}' is not an \
         integer type"
    )]
    AutoIncrementRequiresInteger {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Declared type.
        column_type: String,
    },

    /// The schema document could not be parsed.
    #[error("invalid schema document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors returned by [`QueryBuilder`](crate::query::QueryBuilder) terminal
/// operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// `insert`, `update` or a batch operation was called without data.
    #[error("no values to write")]
    EmptyValues,

    /// The connection to the database is unusable.
    #[error("connection error: {0}")]
    Connection(String),

    /// The driver rejected the statement.
    #[error("statement failed: {0}")]
    Execution(String),
}

impl From<DriverError> for QueryError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Connection(message) => Self::Connection(message),
            other => Self::Execution(other.to_string()),
        }
    }
}

/// Errors raised by the [`SchemaReconciler`](crate::reconcile::SchemaReconciler).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Introspection or DDL execution failed.
    #[error("reconciling '{table}' failed: {source}")]
    Driver {
        /// Table being reconciled.
        table: String,
        /// Underlying driver error.
        #[source]
        source: DriverError,
    },
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_stay_distinct() {
        let err: QueryError = DriverError::Connection("refused".into()).into();
        assert_eq!(err, QueryError::Connection("refused".into()));
    }

    #[test]
    fn test_execution_errors_keep_driver_message() {
        let err: QueryError = DriverError::Execution("syntax error near FROM".into()).into();
        assert!(err.to_string().contains("syntax error near FROM"));
    }
}
