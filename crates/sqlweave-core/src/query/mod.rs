//! Schema-aware query builder.
//!
//! A [`QueryBuilder`] is bound to one table and accumulates joins,
//! conditions, grouping, ordering and pagination until a terminal operation
//! (`select`, `insert`, `update`, `delete`, ...) renders the statement and
//! sends it to the driver. Every terminal operation clears the accumulated
//! state, whether it succeeds or not.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut users = db.table("users");
//! let id = users.insert(&Values::new().set("active", true))?;
//! let row = users
//!     .where_clause("active", "=", true)
//!     .select_one(["id"])?;
//! ```

mod insert;
mod select;
mod update;

use std::panic::Location;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::condition::{
    Condition, ConditionBuilder, Connective, FullTextMode, Operand, Operator, Predicate,
    RenderContext,
};
use crate::dialect::Dialect;
use crate::driver::{Driver, Execution};
use crate::error::Result;
use crate::params::{ParameterBinder, ParameterSet};
use crate::schema::TableSchema;
use crate::trace::QueryTracer;
use crate::value::SqlValue;

pub use select::Columns;

/// Default number of rows per statement for batch operations.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Kind of a `JOIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    /// `LEFT JOIN`
    #[default]
    Left,
    /// `RIGHT JOIN`
    Right,
}

impl JoinKind {
    /// Parses a join kind; anything other than `right` is `LEFT`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("right") {
            Self::Right
        } else {
            Self::Left
        }
    }

    const fn as_sql(self) -> &'static str {
        match self {
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
        }
    }
}

/// Sort direction of `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// No explicit direction.
    #[default]
    Unspecified,
    /// `ASC`
    Asc,
    /// `DESC`
    Desc,
}

impl Order {
    /// Parses a direction; anything other than `asc`/`desc` is unspecified.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "ASC" => Self::Asc,
            "DESC" => Self::Desc,
            _ => Self::Unspecified,
        }
    }
}

#[derive(Debug, Clone)]
struct Having {
    column: String,
    comparison: &'static str,
    value: SqlValue,
}

/// Accumulated clauses, taken as a whole by each terminal operation.
#[derive(Debug, Default)]
struct Clauses {
    conditions: ConditionBuilder,
    joins: Vec<String>,
    group: Option<String>,
    having: Option<Having>,
    order: Option<String>,
    limit: Option<(u64, u64)>,
}

/// Builds and runs statements against one table.
pub struct QueryBuilder<'a, D: Driver> {
    driver: &'a D,
    dialect: &'a dyn Dialect,
    table: String,
    schema: Arc<TableSchema>,
    binder: ParameterBinder,
    clauses: Clauses,
    tracer: Option<&'a QueryTracer>,
    location: &'static Location<'static>,
}

impl<'a, D: Driver> QueryBuilder<'a, D> {
    /// Creates a builder for `table` described by `schema`.
    #[must_use]
    #[track_caller]
    pub fn new(
        driver: &'a D,
        dialect: &'a dyn Dialect,
        table: impl Into<String>,
        schema: Arc<TableSchema>,
    ) -> Self {
        Self {
            driver,
            dialect,
            table: table.into(),
            schema,
            binder: ParameterBinder::new(),
            clauses: Clauses::default(),
            tracer: None,
            location: Location::caller(),
        }
    }

    /// Records every executed statement in `tracer`, attributed to
    /// `location`.
    #[must_use]
    pub fn with_tracer(
        mut self,
        tracer: &'a QueryTracer,
        location: &'static Location<'static>,
    ) -> Self {
        self.tracer = Some(tracer);
        self.location = location;
        self
    }

    /// Name of the table this builder targets.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Schema of the table this builder targets.
    #[must_use]
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    // ==================== Accumulators ====================

    /// Adds `column operator operand`, joined to the next condition with
    /// `AND`. Malformed conditions are skipped.
    pub fn where_clause(
        &mut self,
        column: &str,
        operator: &str,
        operand: impl Into<Operand>,
    ) -> &mut Self {
        self.where_with(column, operator, operand, Connective::And)
    }

    /// Like [`QueryBuilder::where_clause`], joined to the next condition
    /// with `connective`.
    pub fn where_with(
        &mut self,
        column: &str,
        operator: &str,
        operand: impl Into<Operand>,
        connective: Connective,
    ) -> &mut Self {
        if let Some(condition) = Condition::build(column, operator, operand.into()) {
            self.clauses.conditions.add(condition, connective);
        }
        self
    }

    /// Adds several conditions at once, optionally parenthesized and joined
    /// to whatever follows with `end`.
    ///
    /// ```rust,ignore
    /// users.multi_where(
    ///     [("age", ">", 18).into(), ("status", "=", "active", "or").into()],
    ///     true,
    ///     Connective::And,
    /// );
    /// // (`age` > :where_0_age OR `status` = :where_1_status)
    /// ```
    pub fn multi_where(
        &mut self,
        predicates: impl IntoIterator<Item = Predicate>,
        grouped: bool,
        end: Connective,
    ) -> &mut Self {
        self.clauses.conditions.add_group(predicates, grouped, end);
        self
    }

    /// Searches `phrase` over `columns`.
    pub fn full_text_search(
        &mut self,
        columns: &[&str],
        phrase: &str,
        explode_words: bool,
        mode: FullTextMode,
    ) -> &mut Self {
        self.clauses
            .conditions
            .add_full_text_search(columns, phrase, explode_words, mode, Connective::And);
        self
    }

    /// Adds `kind JOIN table ON on…`. The table and join expression are
    /// emitted verbatim.
    pub fn join(&mut self, kind: JoinKind, table: &str, on: &[&str]) -> &mut Self {
        let mut join = format!("{} {table} ON", kind.as_sql());
        for part in on {
            join.push(' ');
            join.push_str(part);
        }
        self.clauses.joins.push(join);
        self
    }

    /// Sets `GROUP BY expression`, emitted verbatim.
    pub fn group(&mut self, expression: &str) -> &mut Self {
        self.clauses.group = Some(expression.to_string());
        self
    }

    /// Sets `HAVING COUNT(column) comparison value`. The value is bound; an
    /// unknown comparison is ignored.
    pub fn having(
        &mut self,
        column: &str,
        comparison: &str,
        value: impl crate::value::ToSqlValue,
    ) -> &mut Self {
        match Operator::parse(comparison) {
            Some(Operator::Compare(comparison)) => {
                self.clauses.having = Some(Having {
                    column: column.to_string(),
                    comparison,
                    value: value.to_sql_value(),
                });
            }
            _ => trace!(column, comparison, "Skipping HAVING with unknown comparison"),
        }
        self
    }

    /// Sets `ORDER BY expression [direction]`, emitted verbatim.
    pub fn order(&mut self, expression: &str, direction: Order) -> &mut Self {
        if expression.trim().is_empty() {
            return self;
        }
        let clause = match direction {
            Order::Unspecified => format!("ORDER BY {expression}"),
            Order::Asc => format!("ORDER BY {expression} ASC"),
            Order::Desc => format!("ORDER BY {expression} DESC"),
        };
        self.clauses.order = Some(clause);
        self
    }

    /// Orders rows randomly.
    pub fn random_order(&mut self) -> &mut Self {
        self.clauses.order = Some(format!("ORDER BY {}", self.dialect.random_order_expression()));
        self
    }

    /// Returns at most `count` rows, skipping `offset`. A `count` of zero
    /// removes the limit.
    pub fn limit(&mut self, count: u64, offset: u64) -> &mut Self {
        self.clauses.limit = (count > 0).then_some((count, offset));
        self
    }

    /// Clears accumulated state without running anything.
    pub fn reset(&mut self) {
        self.clauses = Clauses::default();
        drop(self.binder.take());
    }

    // ==================== Terminal operations ====================

    /// Deletes the rows matching the accumulated conditions.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the statement.
    pub fn delete(&mut self) -> Result<u64> {
        let clauses = self.take_clauses();
        let mut sql = format!("DELETE FROM {}", self.quoted_table());
        sql.push_str(&self.render_where(&clauses));
        let params = self.binder.take();
        Ok(self.dispatch(&sql, &params)?.rows_affected)
    }

    /// Removes every row of the table. Accumulated conditions are
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the statement.
    pub fn truncate(&mut self) -> Result<()> {
        self.reset();
        let sql = self.dialect.truncate(&self.quoted_table());
        self.dispatch(&sql, &ParameterSet::new())?;
        Ok(())
    }

    /// Runs caller-supplied SQL. Accumulated state is neither used nor
    /// cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the statement.
    pub fn raw_query(&self, sql: &str) -> Result<Execution> {
        self.dispatch(sql, &ParameterSet::new())
    }

    // ==================== Internals ====================

    fn take_clauses(&mut self) -> Clauses {
        drop(self.binder.take());
        std::mem::take(&mut self.clauses)
    }

    fn quoted_table(&self) -> String {
        self.dialect.quote_identifier(&self.table)
    }

    fn render_context(&mut self) -> RenderContext<'_> {
        RenderContext {
            dialect: self.dialect,
            schema: &self.schema,
            binder: &mut self.binder,
        }
    }

    fn render_where(&mut self, clauses: &Clauses) -> String {
        let mut ctx = self.render_context();
        let conditions = clauses.conditions.render(&mut ctx);
        if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {conditions}")
        }
    }

    // JOIN / WHERE / GROUP BY / HAVING / ORDER BY / LIMIT
    fn render_tail(&mut self, clauses: &Clauses) -> String {
        let mut sql = String::new();
        for join in &clauses.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        sql.push_str(&self.render_where(clauses));
        if let Some(group) = &clauses.group {
            sql.push_str(" GROUP BY ");
            sql.push_str(group);
        }
        if let Some(having) = &clauses.having {
            let placeholder = self.binder.bind("having", &having.column, having.value.clone());
            sql.push_str(&format!(
                " HAVING COUNT({}) {} {placeholder}",
                self.dialect.quote_identifier(&having.column),
                having.comparison
            ));
        }
        if let Some(order) = &clauses.order {
            sql.push(' ');
            sql.push_str(order);
        }
        if let Some((count, offset)) = clauses.limit {
            sql.push(' ');
            sql.push_str(&self.dialect.paginate(count, offset));
        }
        sql
    }

    fn dispatch(&self, sql: &str, params: &ParameterSet) -> Result<Execution> {
        let started = Instant::now();
        let result = self.driver.run(sql, params);
        let elapsed = started.elapsed();
        if let Some(tracer) = self.tracer {
            tracer.record(params.render_inline(sql), elapsed, self.location);
        }
        match result {
            Ok(execution) => {
                debug!(
                    table = %self.table,
                    sql = %sql,
                    params = params.len(),
                    elapsed = ?elapsed,
                    "Executed statement"
                );
                Ok(execution)
            }
            Err(err) => {
                warn!(
                    table = %self.table,
                    sql = %sql,
                    error = %err,
                    location = %self.location,
                    "Statement failed"
                );
                Err(err.into())
            }
        }
    }
}
