//! Schema reconciliation tool for sqlweave.
//!
//! Loads a JSON schema document (`{table: {column: definition}}`), connects
//! to the database named by `--database-url` and compares every declared
//! table with its live structure. DDL is rendered in the dialect of the
//! database backend.
//!
//! # CLI Usage
//!
//! ```bash
//! # Show the DDL that would be executed
//! sqlweave-migrate --schema schema.json plan
//!
//! # Apply additive changes only
//! sqlweave-migrate --schema schema.json apply
//!
//! # Also drop undeclared columns and indexes, keeping one index
//! sqlweave-migrate --schema schema.json apply --full --preserve-index search
//!
//! # Reconcile a MySQL database (requires the `mysql` feature)
//! sqlweave-migrate --database-url mysql://root@localhost/app apply
//! ```

pub mod cli;
pub mod error;
pub mod runner;

pub use cli::{Cli, Command, DialectArg};
pub use error::{MigrateError, Result};
pub use runner::{load_registry, run, run_command, select_dialect};
