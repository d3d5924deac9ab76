//! Executes CLI commands against a database.

use std::io::Write;
use std::path::Path;

use sqlweave_core::{Database, Dialect, Driver, SchemaRegistry};
use sqlweave_sqlx::SqliteDriver;
use tracing::{debug, info};

use crate::cli::{Cli, Command, DialectArg};
use crate::error::{MigrateError, Result};

/// Reads and parses the schema file at `path`.
///
/// # Errors
///
/// Returns [`MigrateError::SchemaFile`] if the file cannot be read and
/// [`MigrateError::Schema`] if it is not a valid schema document.
pub fn load_registry(path: &Path, table_prefix: &str) -> Result<SchemaRegistry> {
    let document = std::fs::read_to_string(path).map_err(|source| MigrateError::SchemaFile {
        path: path.to_path_buf(),
        source,
    })?;
    let registry = SchemaRegistry::from_json_str(table_prefix, &document)?;
    debug!(path = %path.display(), tables = registry.len(), "Loaded schema file");
    Ok(registry)
}

/// Runs `cli.command`, writing the report to `out`.
///
/// # Errors
///
/// Returns an error if the schema cannot be loaded, the database cannot be
/// reached, `--dialect` does not fit the database, or reconciliation fails.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let registry = load_registry(&cli.schema, &cli.table_prefix)?;
    let url = cli.database_url.as_str();
    let backend = DialectArg::for_url(url)
        .ok_or_else(|| MigrateError::UnsupportedDatabase(url.to_string()))?;
    let dialect = select_dialect(cli.dialect, backend)?;
    debug!(dialect = dialect.name(), "Selected dialect");

    match backend {
        DialectArg::Sqlite => {
            let driver = SqliteDriver::connect(url)?;
            run_command(&Database::new(driver, dialect, registry), &cli.command, out)
        }
        DialectArg::Mysql => run_mysql(url, dialect, registry, &cli.command, out),
        DialectArg::Postgres => Err(MigrateError::UnsupportedDatabase(format!(
            "{url} (no PostgreSQL driver)"
        ))),
    }
}

/// Returns the dialect of `backend`, rejecting a different `requested` one.
///
/// # Errors
///
/// Returns [`MigrateError::DialectMismatch`] when `requested` is not the
/// backend's dialect.
pub fn select_dialect(
    requested: Option<DialectArg>,
    backend: DialectArg,
) -> Result<Box<dyn Dialect>> {
    match requested {
        Some(dialect) if dialect != backend => Err(MigrateError::DialectMismatch {
            dialect: dialect.name(),
            backend: backend.name(),
        }),
        _ => Ok(backend.build()),
    }
}

#[cfg(feature = "mysql")]
fn run_mysql<W: Write>(
    url: &str,
    dialect: Box<dyn Dialect>,
    registry: SchemaRegistry,
    command: &Command,
    out: &mut W,
) -> Result<()> {
    let driver = sqlweave_sqlx::MySqlDriver::connect(url)?;
    run_command(&Database::new(driver, dialect, registry), command, out)
}

#[cfg(not(feature = "mysql"))]
fn run_mysql<W: Write>(
    url: &str,
    _dialect: Box<dyn Dialect>,
    _registry: SchemaRegistry,
    _command: &Command,
    _out: &mut W,
) -> Result<()> {
    Err(MigrateError::UnsupportedDatabase(format!(
        "{url} (built without the mysql feature)"
    )))
}

/// Runs `command` against an open database.
///
/// # Errors
///
/// See [`run`].
pub fn run_command<D: Driver, W: Write>(
    db: &Database<D>,
    command: &Command,
    out: &mut W,
) -> Result<()> {
    let options = command.reconcile_options();
    match command {
        Command::Plan { .. } => {
            let plan = db.plan(&options)?;
            if plan.is_empty() {
                writeln!(out, "Schema is up to date.")?;
            }
            for sql in &plan {
                writeln!(out, "{sql};")?;
            }
        }

        Command::Apply { .. } => {
            let applied = db.reconcile(&options)?;
            info!(
                dialect = db.dialect().name(),
                statements = applied.len(),
                "Reconciliation finished"
            );
            if applied.is_empty() {
                writeln!(out, "Nothing to apply.")?;
            }
            for sql in &applied {
                writeln!(out, "{sql};")?;
            }
        }

        Command::Tables => {
            for (name, schema) in db.registry().iter() {
                let state = if db.driver().table_exists(name)? {
                    "present"
                } else {
                    "missing"
                };
                writeln!(out, "{name}\t{} columns\t{state}", schema.len())?;
            }
        }
    }
    Ok(())
}
