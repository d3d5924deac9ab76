//! Schema reconciliation.
//!
//! Compares registered [`TableSchema`]s with the live database and emits
//! the DDL that brings the database in line:
//!
//! - a missing table is created with all its columns and indexes;
//! - missing columns are added, and columns whose type differs are modified
//!   (auto-increment and primary key columns are never touched);
//! - missing `idx_<column>` / `uniq_<column>` indexes are added. A live
//!   index over the same column with the same uniqueness counts as present
//!   whatever its name.
//!
//! In [`ReconcileMode::Full`] columns and indexes absent from the schema are
//! dropped as well, except the primary key index and the indexes listed in
//! [`ReconcileOptions::preserved_indexes`].

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::dialect::{DdlClause, Dialect};
use crate::driver::{Driver, IndexOrigin, LiveColumn, LiveIndex};
use crate::error::ReconcileError;
use crate::params::ParameterSet;
use crate::schema::{ColumnDefinition, SchemaRegistry, TableSchema};

const INDEX_PREFIX: &str = "idx_";
const UNIQUE_PREFIX: &str = "uniq_";

/// What a reconciliation may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileMode {
    /// Additive changes only.
    #[default]
    Safe,
    /// Additive and destructive changes.
    Full,
}

/// Reconciliation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// What may change.
    pub mode: ReconcileMode,
    /// Indexes that full mode must never drop.
    pub preserved_indexes: BTreeSet<String>,
}

impl ReconcileOptions {
    /// Additive-only options.
    #[must_use]
    pub fn safe() -> Self {
        Self::default()
    }

    /// Options that also drop columns and indexes absent from the schema.
    #[must_use]
    pub fn full() -> Self {
        Self {
            mode: ReconcileMode::Full,
            ..Self::default()
        }
    }

    /// Protects `name` from being dropped.
    #[must_use]
    pub fn preserve_index(mut self, name: impl Into<String>) -> Self {
        self.preserved_indexes.insert(name.into());
        self
    }
}

/// A single-column index derived from a column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Index name.
    pub name: String,
    /// Indexed column.
    pub column: String,
    /// Unique index.
    pub unique: bool,
}

/// Live structure of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveTable {
    /// Columns in ordinal order.
    pub columns: Vec<LiveColumn>,
    /// Indexes by name.
    pub indexes: BTreeMap<String, LiveIndex>,
}

impl LiveTable {
    fn column(&self, name: &str) -> Option<&LiveColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Name of the live index that satisfies `index`.
    fn satisfying(&self, index: &IndexSpec) -> Option<&str> {
        self.indexes
            .get_key_value(&index.name)
            .or_else(|| {
                self.indexes
                    .iter()
                    .find(|(_, live)| live.covers(&index.column, index.unique))
            })
            .map(|(name, _)| name.as_str())
    }
}

/// Changes needed to bring one existing table in line with its schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    /// Columns to add.
    pub add_columns: Vec<(String, ColumnDefinition)>,
    /// Columns whose type must change.
    pub modify_columns: Vec<(String, ColumnDefinition)>,
    /// Columns to drop.
    pub drop_columns: Vec<String>,
    /// Indexes to add.
    pub add_indexes: Vec<IndexSpec>,
    /// Live indexes to drop.
    pub drop_indexes: Vec<(String, LiveIndex)>,
}

impl SchemaDiff {
    /// Returns `true` if nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add_columns.is_empty()
            && self.modify_columns.is_empty()
            && self.drop_columns.is_empty()
            && self.add_indexes.is_empty()
            && self.drop_indexes.is_empty()
    }

    /// Renders the diff as DDL statements.
    ///
    /// Every inline change goes into a single `ALTER TABLE`, or one per
    /// clause when the dialect cannot batch them. Standalone index drops run
    /// before it and standalone index creations after it.
    #[must_use]
    pub fn to_statements(&self, table: &str, dialect: &dyn Dialect) -> Vec<String> {
        let mut before = Vec::new();
        let mut clauses = Vec::new();
        let mut after = Vec::new();

        for (name, index) in &self.drop_indexes {
            match dialect.drop_index(table, name, index) {
                Some(DdlClause::Inline(clause)) => clauses.push(clause),
                Some(DdlClause::Standalone(statement)) => before.push(statement),
                None => {}
            }
        }
        for (name, def) in &self.add_columns {
            clauses.push(dialect.add_column(name, def));
        }
        for (name, def) in &self.modify_columns {
            clauses.push(dialect.modify_column(name, def));
        }
        for name in &self.drop_columns {
            clauses.push(dialect.drop_column(name));
        }
        for index in &self.add_indexes {
            match dialect.add_index(table, index) {
                DdlClause::Inline(clause) => clauses.push(clause),
                DdlClause::Standalone(statement) => after.push(statement),
            }
        }

        let mut statements = before;
        let alter = format!("ALTER TABLE {}", dialect.quote_identifier(table));
        if dialect.batches_alter_clauses() {
            if !clauses.is_empty() {
                statements.push(format!("{alter} {}", clauses.join(", ")));
            }
        } else {
            statements.extend(clauses.iter().map(|clause| format!("{alter} {clause}")));
        }
        statements.extend(after);
        statements
    }
}

/// Name of the managed index of `column`.
#[must_use]
pub fn index_name(dialect: &dyn Dialect, table: &str, column: &str, unique: bool) -> String {
    let prefix = if unique { UNIQUE_PREFIX } else { INDEX_PREFIX };
    dialect.index_name(table, &format!("{prefix}{column}"))
}

/// Indexes `schema` asks for, in column order (plain before unique for the
/// same column).
#[must_use]
pub fn desired_indexes(
    dialect: &dyn Dialect,
    table: &str,
    schema: &TableSchema,
) -> Vec<IndexSpec> {
    let mut indexes = Vec::new();
    for (column, def) in schema.iter() {
        if def.index {
            indexes.push(IndexSpec {
                name: index_name(dialect, table, column, false),
                column: column.to_string(),
                unique: false,
            });
        }
        if def.unique {
            indexes.push(IndexSpec {
                name: index_name(dialect, table, column, true),
                column: column.to_string(),
                unique: true,
            });
        }
    }
    indexes
}

/// Statements creating `table` from scratch.
#[must_use]
pub fn create_table_statements(
    dialect: &dyn Dialect,
    table: &str,
    schema: &TableSchema,
) -> Vec<String> {
    let mut parts: Vec<String> = schema
        .iter()
        .map(|(name, def)| dialect.column_definition(name, def))
        .collect();
    let mut after = Vec::new();
    for index in desired_indexes(dialect, table, schema) {
        match dialect.create_table_index(table, &index) {
            DdlClause::Inline(clause) => parts.push(clause),
            DdlClause::Standalone(statement) => after.push(statement),
        }
    }
    let mut statements = vec![format!(
        "CREATE TABLE {} ({})",
        dialect.quote_identifier(table),
        parts.join(", ")
    )];
    statements.extend(after);
    statements
}

/// Computes the changes that bring `live` in line with `schema`.
#[must_use]
pub fn diff_table(
    dialect: &dyn Dialect,
    table: &str,
    schema: &TableSchema,
    live: &LiveTable,
    options: &ReconcileOptions,
) -> SchemaDiff {
    let full = options.mode == ReconcileMode::Full;
    let mut diff = SchemaDiff::default();

    for (name, def) in schema.iter() {
        match live.column(name) {
            None => diff.add_columns.push((name.to_string(), def.clone())),
            Some(column) => {
                if def.is_key_column() || dialect.types_match(&column.reported_type, def) {
                    continue;
                }
                if !dialect.alters_column_types() {
                    warn!(
                        table,
                        column = name,
                        reported = %column.reported_type,
                        dialect = dialect.name(),
                        "Column type differs but cannot be changed in place"
                    );
                    continue;
                }
                debug!(
                    table,
                    column = name,
                    reported = %column.reported_type,
                    desired = %dialect.type_signature(def),
                    "Column type differs"
                );
                diff.modify_columns.push((name.to_string(), def.clone()));
            }
        }
    }
    if full {
        diff.drop_columns = live
            .columns
            .iter()
            .filter(|column| !schema.contains(&column.name))
            .map(|column| column.name.clone())
            .collect();
    }

    let mut kept: BTreeSet<&str> = BTreeSet::new();
    for index in desired_indexes(dialect, table, schema) {
        match live.satisfying(&index) {
            Some(name) => {
                kept.insert(name);
            }
            None => diff.add_indexes.push(index),
        }
    }
    if full {
        for (name, index) in &live.indexes {
            if index.origin == IndexOrigin::PrimaryKey
                || dialect.is_primary_index(table, name)
                || kept.contains(name.as_str())
                || options.preserved_indexes.contains(name)
            {
                continue;
            }
            if dialect.drop_index(table, name, index).is_none() {
                warn!(table, index = %name, "Index cannot be dropped without rebuilding the table");
                continue;
            }
            if !is_managed_index(dialect, table, name) {
                warn!(table, index = %name, "Dropping an index that sqlweave did not create");
            }
            diff.drop_indexes.push((name.clone(), index.clone()));
        }
    }
    diff
}

fn managed_suffix<'n>(dialect: &dyn Dialect, table: &str, name: &'n str) -> &'n str {
    let prefix = dialect.index_name(table, "");
    name.strip_prefix(prefix.as_str()).unwrap_or(name)
}

fn is_managed_index(dialect: &dyn Dialect, table: &str, name: &str) -> bool {
    let suffix = managed_suffix(dialect, table, name);
    suffix.starts_with(INDEX_PREFIX) || suffix.starts_with(UNIQUE_PREFIX)
}

/// Runs reconciliation through a [`Driver`].
pub struct SchemaReconciler<'a, D: Driver> {
    driver: &'a D,
    dialect: &'a dyn Dialect,
    options: ReconcileOptions,
}

impl<'a, D: Driver> SchemaReconciler<'a, D> {
    /// Creates a reconciler.
    #[must_use]
    pub const fn new(driver: &'a D, dialect: &'a dyn Dialect, options: ReconcileOptions) -> Self {
        Self {
            driver,
            dialect,
            options,
        }
    }

    /// Options in effect.
    #[must_use]
    pub const fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Returns the statements every registered table needs, without
    /// executing them.
    ///
    /// # Errors
    ///
    /// Returns an error if introspection fails.
    pub fn plan(&self, registry: &SchemaRegistry) -> Result<Vec<String>, ReconcileError> {
        let mut statements = Vec::new();
        for (table, schema) in registry.iter() {
            statements.extend(self.plan_table(table, schema)?);
        }
        Ok(statements)
    }

    /// Applies the statements every registered table needs and returns
    /// them.
    ///
    /// # Errors
    ///
    /// Returns an error if introspection or a statement fails. Tables
    /// reconciled before the failure stay reconciled.
    pub fn reconcile(&self, registry: &SchemaRegistry) -> Result<Vec<String>, ReconcileError> {
        let mut applied = Vec::new();
        for (table, schema) in registry.iter() {
            applied.extend(self.reconcile_table(table, schema)?);
        }
        Ok(applied)
    }

    /// Returns the statements `table` needs.
    ///
    /// # Errors
    ///
    /// Returns an error if introspection fails.
    pub fn plan_table(
        &self,
        table: &str,
        schema: &TableSchema,
    ) -> Result<Vec<String>, ReconcileError> {
        let wrap = |source| ReconcileError::Driver {
            table: table.to_string(),
            source,
        };
        if !self.driver.table_exists(table).map_err(wrap)? {
            return Ok(create_table_statements(self.dialect, table, schema));
        }
        let live = LiveTable {
            columns: self.driver.introspect_columns(table).map_err(wrap)?,
            indexes: self.driver.introspect_indexes(table).map_err(wrap)?,
        };
        let diff = diff_table(self.dialect, table, schema, &live, &self.options);
        Ok(diff.to_statements(table, self.dialect))
    }

    /// Applies the statements `table` needs and returns them.
    ///
    /// # Errors
    ///
    /// Returns an error if introspection or a statement fails.
    pub fn reconcile_table(
        &self,
        table: &str,
        schema: &TableSchema,
    ) -> Result<Vec<String>, ReconcileError> {
        let statements = self.plan_table(table, schema)?;
        let params = ParameterSet::new();
        for sql in &statements {
            info!(table, sql = %sql, "Applying DDL");
            self.driver
                .run(sql, &params)
                .map_err(|source| ReconcileError::Driver {
                    table: table.to_string(),
                    source,
                })?;
        }
        info!(table, statements = statements.len(), "Reconciled table");
        Ok(statements)
    }
}
