//! Entry point tying a driver, a dialect and a schema registry together.

use std::panic::Location;

use crate::dialect::{Dialect, MySqlDialect};
use crate::driver::Driver;
use crate::error::ReconcileError;
use crate::query::QueryBuilder;
use crate::reconcile::{ReconcileOptions, SchemaReconciler};
use crate::schema::SchemaRegistry;
use crate::trace::{QueryTrace, QueryTracer};

/// A database handle.
///
/// ```rust,ignore
/// let mut db = Database::new(driver, Box::new(PostgresDialect::new()), registry);
/// db.reconcile(&ReconcileOptions::safe())?;
/// let id = db.table("users").insert(&Values::new().set("active", true))?;
/// ```
#[derive(Debug)]
pub struct Database<D: Driver> {
    driver: D,
    dialect: Box<dyn Dialect>,
    registry: SchemaRegistry,
    tracer: Option<QueryTracer>,
}

impl<D: Driver> Database<D> {
    /// Creates a handle over `driver`.
    #[must_use]
    pub fn new(driver: D, dialect: Box<dyn Dialect>, registry: SchemaRegistry) -> Self {
        Self {
            driver,
            dialect,
            registry,
            tracer: None,
        }
    }

    /// Creates a handle using the MySQL dialect.
    #[must_use]
    pub fn mysql(driver: D, registry: SchemaRegistry) -> Self {
        Self::new(driver, Box::new(MySqlDialect::new()), registry)
    }

    /// Keeps a [`QueryTrace`] for every statement run through
    /// [`Database::table`].
    #[must_use]
    pub fn with_tracing(mut self) -> Self {
        self.tracer = Some(QueryTracer::new());
        self
    }

    /// Returns a query builder for `table`.
    ///
    /// The name is qualified with the registry prefix. An unregistered table
    /// gets an empty schema, so no value coercion applies to it.
    #[must_use]
    #[track_caller]
    pub fn table(&self, table: &str) -> QueryBuilder<'_, D> {
        let name = self.registry.qualify(table);
        let schema = self.registry.table(table);
        let builder = QueryBuilder::new(&self.driver, self.dialect.as_ref(), name, schema);
        match &self.tracer {
            Some(tracer) => builder.with_tracer(tracer, Location::caller()),
            None => builder,
        }
    }

    /// The underlying driver.
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// The dialect in use.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// The registered schemas.
    #[must_use]
    pub const fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Swaps in a new set of schemas, typically between migration runs.
    pub fn reload_registry(&mut self, registry: SchemaRegistry) {
        self.registry = registry;
    }

    /// Returns a reconciler over this database.
    #[must_use]
    pub fn reconciler(&self, options: ReconcileOptions) -> SchemaReconciler<'_, D> {
        SchemaReconciler::new(&self.driver, self.dialect.as_ref(), options)
    }

    /// Lists the DDL that would bring every registered table up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if introspection fails.
    pub fn plan(&self, options: &ReconcileOptions) -> Result<Vec<String>, ReconcileError> {
        self.reconciler(options.clone()).plan(&self.registry)
    }

    /// Brings every registered table up to date and returns the executed
    /// DDL.
    ///
    /// # Errors
    ///
    /// Returns an error if introspection or a statement fails.
    pub fn reconcile(&self, options: &ReconcileOptions) -> Result<Vec<String>, ReconcileError> {
        self.reconciler(options.clone()).reconcile(&self.registry)
    }

    /// Statements traced so far. Empty unless tracing is enabled.
    #[must_use]
    pub fn traces(&self) -> Vec<QueryTrace> {
        self.tracer.as_ref().map(QueryTracer::records).unwrap_or_default()
    }

    /// Removes and returns the statements traced so far.
    pub fn take_traces(&self) -> Vec<QueryTrace> {
        self.tracer.as_ref().map(QueryTracer::drain).unwrap_or_default()
    }

    /// Consumes the handle and returns the driver.
    #[must_use]
    pub fn into_driver(self) -> D {
        self.driver
    }
}
