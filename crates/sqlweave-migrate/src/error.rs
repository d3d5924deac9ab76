//! Error types for the migration tool.

use std::path::PathBuf;

use sqlweave_core::{DriverError, ReconcileError, SchemaError};

/// Errors that can occur while planning or applying a reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// The schema file could not be read.
    #[error("Failed to read schema file '{path}': {source}")]
    SchemaFile {
        /// Path to the schema file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// IO error while writing the report.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The schema document is malformed or declares an invalid column.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Connecting or talking to the database failed.
    #[error("Database error: {0}")]
    Driver(#[from] DriverError),

    /// Reconciling one of the tables failed.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// The database url names a backend this build cannot reach.
    #[error("Unsupported database url '{0}'")]
    UnsupportedDatabase(String),

    /// `--dialect` does not match the backend of the database url.
    #[error("The {dialect} dialect cannot be used with a {backend} database")]
    DialectMismatch {
        /// Requested dialect.
        dialect: &'static str,
        /// Dialect of the database url.
        backend: &'static str,
    },
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
