//! # sqlweave-core
//!
//! Schema-driven SQL generation and schema reconciliation.
//!
//! Tables are described once as [`TableSchema`]s in a [`SchemaRegistry`].
//! From there:
//!
//! - [`QueryBuilder`] composes parameterized `SELECT`, `INSERT`, `UPDATE`,
//!   `DELETE` and batch statements from a small condition algebra. Values
//!   are always bound as named parameters and coerced according to the
//!   declared column types.
//! - [`SchemaReconciler`] compares the registry with the live database and
//!   emits the DDL that brings it in line, additively by default.
//!
//! Syntax differences between backends live in [`Dialect`]
//! implementations ([`MySqlDialect`], [`PostgresDialect`],
//! [`SqliteDialect`]). Execution and
//! introspection go through the [`Driver`] trait; `sqlweave-sqlx` provides
//! implementations over sqlx.
//!
//! ## Example
//!
//! ```rust
//! use sqlweave_core::{
//!     ColumnDefinition, ColumnType, MySqlDialect, SchemaRegistry, TableSchema,
//!     create_table_statements,
//! };
//!
//! let users = TableSchema::new()
//!     .column(
//!         "id",
//!         ColumnDefinition::new(ColumnType::Int).auto_increment().primary(),
//!     )
//!     .column("active", ColumnDefinition::new(ColumnType::Boolean));
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register("users", users).unwrap();
//!
//! let ddl = create_table_statements(&MySqlDialect::new(), "users", &registry.table("users"));
//! assert_eq!(
//!     ddl,
//!     vec!["CREATE TABLE `users` (`id` INT AUTO_INCREMENT PRIMARY KEY, `active` TINYINT(1))"]
//! );
//! ```

pub mod condition;
pub mod database;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod params;
pub mod query;
pub mod reconcile;
pub mod schema;
pub mod trace;
pub mod value;

pub use condition::{Condition, ConditionBuilder, Connective, FullTextMode, Operand, Predicate};
pub use database::Database;
pub use dialect::{DdlClause, Dialect, MySqlDialect, PostgresDialect, SqliteDialect};
pub use driver::{Driver, Execution, IndexOrigin, LiveColumn, LiveIndex};
pub use error::{DriverError, QueryError, ReconcileError, Result, SchemaError};
pub use params::{ParameterBinder, ParameterSet, PlaceholderStyle, PreparedStatement};
pub use query::{Columns, JoinKind, Order, QueryBuilder, DEFAULT_CHUNK_SIZE};
pub use reconcile::{
    create_table_statements, diff_table, IndexSpec, LiveTable, ReconcileMode, ReconcileOptions,
    SchemaDiff, SchemaReconciler,
};
pub use schema::{ColumnDefinition, ColumnType, SchemaRegistry, TableSchema};
pub use trace::{QueryTrace, QueryTracer};
pub use value::{Row, SqlValue, ToSqlValue, Values};
