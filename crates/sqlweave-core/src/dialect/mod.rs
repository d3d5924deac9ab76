//! SQL dialect support.
//!
//! Every piece of backend-specific text, from identifier quoting to DDL
//! shapes, is produced by a [`Dialect`]. The query builder and the schema
//! reconciler never hard-code syntax.

mod mysql;
mod postgres;
mod sqlite;

use std::fmt;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::driver::LiveIndex;
use crate::reconcile::IndexSpec;
use crate::schema::{is_current_timestamp, ColumnDefinition, ColumnType, TableSchema};
use crate::value::SqlValue;

/// One piece of index DDL.
///
/// Some backends can express an index change inside `CREATE TABLE` or
/// `ALTER TABLE`; others need a statement of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlClause {
    /// Clause placed inside the table statement.
    Inline(String),
    /// Statement executed after the table statement.
    Standalone(String),
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char;

    /// Quotes an identifier.
    ///
    /// Dotted names are quoted per segment, `*` is left untouched and
    /// embedded quote characters are doubled.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let doubled: String = [quote, quote].iter().collect();
        name.split('.')
            .map(|segment| {
                if segment == "*" {
                    segment.to_string()
                } else {
                    let escaped = segment.replace(quote, &doubled);
                    format!("{quote}{escaped}{quote}")
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Renders the pagination clause, without a leading space.
    fn paginate(&self, limit: u64, offset: u64) -> String;

    /// Expression used by `ORDER BY` for random ordering.
    fn random_order_expression(&self) -> &'static str;

    /// Clause appended to `INSERT` to read back the generated key, if the
    /// backend supports it.
    fn insert_returning_clause(&self, _primary_key: &str) -> Option<String> {
        None
    }

    /// Returns whether booleans are a native type.
    fn native_booleans(&self) -> bool {
        false
    }

    /// Representation of a boolean bound for a `boolean` column.
    fn boolean_value(&self, value: bool) -> SqlValue {
        if self.native_booleans() {
            SqlValue::Bool(value)
        } else {
            SqlValue::Int(i64::from(value))
        }
    }

    /// Case-sensitive regular expression match of `expression` against the
    /// bound `pattern`.
    fn regexp(&self, expression: &str, pattern: &str) -> String {
        format!("{expression} REGEXP {pattern}")
    }

    /// Null-safe equality operator.
    fn null_safe_equals(&self) -> &'static str {
        "<=>"
    }

    /// Case-insensitive regular expression match of `expression` against
    /// the bound `pattern`.
    fn regex_match(&self, expression: &str, pattern: &str) -> String;

    /// Full-text predicate over already quoted `columns` against the bound
    /// `query`.
    fn full_text_match(&self, columns: &[String], query: &str) -> String;

    /// Builds the full-text query text for `tokens`, or an empty string when
    /// no usable token remains.
    fn full_text_query(&self, tokens: &[String]) -> String;

    /// JSON containment test of `column` against the bound `document`.
    fn json_contains(&self, column: &str, document: &str) -> String;

    /// Statement emptying `table` (already quoted).
    fn truncate(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {table}")
    }

    // ==================== DDL ====================

    /// Renders the column type of `def`, including length and modifiers
    /// that belong to the type.
    fn column_type(&self, def: &ColumnDefinition) -> String;

    /// Renders a full column definition for `CREATE TABLE` and
    /// `ADD COLUMN`.
    fn column_definition(&self, name: &str, def: &ColumnDefinition) -> String;

    /// Lowercase type signature that introspection reports for `def`.
    fn type_signature(&self, def: &ColumnDefinition) -> String;

    /// Compares an introspected type with the desired definition.
    fn types_match(&self, reported: &str, def: &ColumnDefinition) -> bool {
        reported.trim().eq_ignore_ascii_case(&self.type_signature(def))
    }

    /// `ALTER TABLE` clause adding a column.
    fn add_column(&self, name: &str, def: &ColumnDefinition) -> String {
        format!("ADD COLUMN {}", self.column_definition(name, def))
    }

    /// `ALTER TABLE` clause changing a column to `def`.
    fn modify_column(&self, name: &str, def: &ColumnDefinition) -> String;

    /// Returns `false` when the backend cannot change the type of an
    /// existing column.
    fn alters_column_types(&self) -> bool {
        true
    }

    /// Returns `false` when `ALTER TABLE` takes a single clause.
    fn batches_alter_clauses(&self) -> bool {
        true
    }

    /// `ALTER TABLE` clause dropping a column.
    fn drop_column(&self, name: &str) -> String {
        format!("DROP COLUMN {}", self.quote_identifier(name))
    }

    /// Name of a managed index on `table`, built from `base`
    /// (`idx_<column>` or `uniq_<column>`).
    fn index_name(&self, _table: &str, base: &str) -> String {
        base.to_string()
    }

    /// Index definition emitted together with `CREATE TABLE`.
    fn create_table_index(&self, table: &str, index: &IndexSpec) -> DdlClause;

    /// Index creation on an existing table.
    fn add_index(&self, table: &str, index: &IndexSpec) -> DdlClause;

    /// Removal of the live index `name`, or `None` when the backend can only
    /// drop it by rebuilding the table.
    fn drop_index(&self, table: &str, name: &str, index: &LiveIndex) -> Option<DdlClause>;

    /// Returns `true` for the index backing the primary key.
    fn is_primary_index(&self, table: &str, name: &str) -> bool;

    /// Returns `true` when the backend has no `ON UPDATE` column attribute
    /// and `update` must set those columns itself.
    fn auto_populates_on_update(&self) -> bool {
        false
    }
}

/// Renders the `DEFAULT` clause of `def`, with a leading space.
pub(crate) fn default_clause(def: &ColumnDefinition) -> String {
    let value = def.default.trim();
    if value.is_empty() {
        String::new()
    } else if is_current_timestamp(value) || value.eq_ignore_ascii_case("NULL") {
        format!(" DEFAULT {}", value.to_ascii_uppercase())
    } else {
        format!(" DEFAULT '{}'", value.replace('\'', "''"))
    }
}

/// Converts a value bound for `column` to the representation the dialect
/// expects for the column's declared type.
pub(crate) fn coerce_for_column(
    dialect: &dyn Dialect,
    schema: &TableSchema,
    column: &str,
    value: SqlValue,
) -> SqlValue {
    let is_boolean = schema
        .get(column)
        .is_some_and(|def| def.column_type == ColumnType::Boolean);
    if !is_boolean {
        return value;
    }
    match value {
        SqlValue::Bool(b) => dialect.boolean_value(b),
        SqlValue::Null => SqlValue::Null,
        other if dialect.native_booleans() => SqlValue::Bool(other.truthy()),
        other => other,
    }
}

/// Removes full-text operator characters from `token`.
pub(crate) fn clean_token(token: &str, operators: &[char]) -> String {
    token.chars().filter(|c| !operators.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_dotted_identifiers() {
        let mysql = MySqlDialect::new();
        let pg = PostgresDialect::new();
        let sqlite = SqliteDialect::new();
        assert_eq!(mysql.quote_identifier("users"), "`users`");
        assert_eq!(mysql.quote_identifier("u.id"), "`u`.`id`");
        assert_eq!(mysql.quote_identifier("u.*"), "`u`.*");
        assert_eq!(mysql.quote_identifier("we`ird"), "`we``ird`");
        assert_eq!(pg.quote_identifier("u.id"), "\"u\".\"id\"");
        assert_eq!(pg.quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(sqlite.quote_identifier("u.id"), "\"u\".\"id\"");
    }

    #[test]
    fn test_default_clause() {
        let plain = ColumnDefinition::new(ColumnType::Varchar).default_value("it's");
        assert_eq!(default_clause(&plain), " DEFAULT 'it''s'");
        let now = ColumnDefinition::new(ColumnType::Timestamp).default_value("current_timestamp");
        assert_eq!(default_clause(&now), " DEFAULT CURRENT_TIMESTAMP");
        let null = ColumnDefinition::new(ColumnType::Int).default_value("null");
        assert_eq!(default_clause(&null), " DEFAULT NULL");
        assert_eq!(default_clause(&ColumnDefinition::new(ColumnType::Int)), "");
    }

    #[test]
    fn test_boolean_values() {
        assert_eq!(MySqlDialect::new().boolean_value(true), SqlValue::Int(1));
        assert_eq!(
            PostgresDialect::new().boolean_value(false),
            SqlValue::Bool(false)
        );
        assert_eq!(SqliteDialect::new().boolean_value(true), SqlValue::Int(1));
    }

    #[test]
    fn test_coerce_only_touches_boolean_columns() {
        let schema = TableSchema::new()
            .column("active", ColumnDefinition::new(ColumnType::Boolean))
            .column("age", ColumnDefinition::new(ColumnType::Int));
        let pg = PostgresDialect::new();
        let mysql = MySqlDialect::new();
        assert_eq!(
            coerce_for_column(&pg, &schema, "active", SqlValue::Int(1)),
            SqlValue::Bool(true)
        );
        assert_eq!(
            coerce_for_column(&mysql, &schema, "active", SqlValue::Bool(false)),
            SqlValue::Int(0)
        );
        assert_eq!(
            coerce_for_column(&mysql, &schema, "age", SqlValue::Bool(true)),
            SqlValue::Bool(true)
        );
        assert_eq!(
            coerce_for_column(&pg, &schema, "missing", SqlValue::Int(1)),
            SqlValue::Int(1)
        );
    }
}
