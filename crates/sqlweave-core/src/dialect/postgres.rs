//! PostgreSQL dialect.

use super::{clean_token, default_clause, DdlClause, Dialect};
use crate::driver::{IndexOrigin, LiveIndex};
use crate::reconcile::IndexSpec;
use crate::schema::{ColumnDefinition, ColumnType};

const TSQUERY_OPERATORS: &[char] = &['&', '|', '!', '(', ')', ':', '*', '\'', '<', '>'];

/// PostgreSQL dialect.
///
/// Index names are schema-wide in PostgreSQL, so managed indexes are
/// prefixed with their table name. Unique indexes are table constraints;
/// plain indexes need statements of their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn identifier_quote(&self) -> char {
        '"'
    }

    fn paginate(&self, limit: u64, offset: u64) -> String {
        if offset == 0 {
            format!("LIMIT {limit}")
        } else {
            format!("LIMIT {limit} OFFSET {offset}")
        }
    }

    fn random_order_expression(&self) -> &'static str {
        "RANDOM()"
    }

    fn insert_returning_clause(&self, primary_key: &str) -> Option<String> {
        Some(format!(" RETURNING {}", self.quote_identifier(primary_key)))
    }

    fn native_booleans(&self) -> bool {
        true
    }

    fn regexp(&self, expression: &str, pattern: &str) -> String {
        format!("{expression} ~ {pattern}")
    }

    fn null_safe_equals(&self) -> &'static str {
        "IS NOT DISTINCT FROM"
    }

    fn regex_match(&self, expression: &str, pattern: &str) -> String {
        format!("{expression} ~* {pattern}")
    }

    fn full_text_match(&self, columns: &[String], query: &str) -> String {
        format!(
            "to_tsvector(concat_ws(' ', {})) @@ to_tsquery({query})",
            columns.join(", ")
        )
    }

    fn full_text_query(&self, tokens: &[String]) -> String {
        tokens
            .iter()
            .map(|token| clean_token(token, TSQUERY_OPERATORS))
            .filter(|token| !token.is_empty())
            .map(|token| format!("{token}:*"))
            .collect::<Vec<_>>()
            .join(" & ")
    }

    fn json_contains(&self, column: &str, document: &str) -> String {
        format!("CAST({column} AS jsonb) @> CAST({document} AS jsonb)")
    }

    fn column_type(&self, def: &ColumnDefinition) -> String {
        let with_length = |name: &str| {
            if def.length > 0 {
                format!("{name}({})", def.length)
            } else {
                name.to_string()
            }
        };
        match &def.column_type {
            ColumnType::Char => with_length("CHAR"),
            ColumnType::Varchar => with_length("VARCHAR"),
            ColumnType::Text => String::from("TEXT"),
            ColumnType::Tinyint | ColumnType::Smallint => String::from("SMALLINT"),
            ColumnType::Int => String::from("INTEGER"),
            ColumnType::Bigint => String::from("BIGINT"),
            ColumnType::Boolean => String::from("BOOLEAN"),
            ColumnType::Float => String::from("REAL"),
            ColumnType::Double => String::from("DOUBLE PRECISION"),
            ColumnType::Decimal => with_length("NUMERIC"),
            ColumnType::Date => String::from("DATE"),
            ColumnType::Datetime | ColumnType::Timestamp => String::from("TIMESTAMP"),
            ColumnType::Json => String::from("JSON"),
            ColumnType::Custom(name) => with_length(&name.to_ascii_uppercase()),
        }
    }

    fn column_definition(&self, name: &str, def: &ColumnDefinition) -> String {
        let column_type = if def.auto_increment {
            match def.column_type {
                ColumnType::Bigint => String::from("BIGSERIAL"),
                ColumnType::Tinyint | ColumnType::Smallint => String::from("SMALLSERIAL"),
                _ => String::from("SERIAL"),
            }
        } else {
            self.column_type(def)
        };
        let mut sql = format!("{} {column_type}", self.quote_identifier(name));
        if !def.auto_increment {
            sql.push_str(&default_clause(def));
        }
        if def.primary {
            sql.push_str(" PRIMARY KEY");
        }
        sql
    }

    fn type_signature(&self, def: &ColumnDefinition) -> String {
        let with_length = |name: &str| {
            if def.length > 0 {
                format!("{name}({})", def.length)
            } else {
                name.to_string()
            }
        };
        match &def.column_type {
            ColumnType::Char => with_length("character"),
            ColumnType::Varchar => with_length("character varying"),
            ColumnType::Text => String::from("text"),
            ColumnType::Tinyint | ColumnType::Smallint => String::from("smallint"),
            ColumnType::Int => String::from("integer"),
            ColumnType::Bigint => String::from("bigint"),
            ColumnType::Boolean => String::from("boolean"),
            ColumnType::Float => String::from("real"),
            ColumnType::Double => String::from("double precision"),
            ColumnType::Decimal => with_length("numeric"),
            ColumnType::Date => String::from("date"),
            ColumnType::Datetime | ColumnType::Timestamp => {
                String::from("timestamp without time zone")
            }
            ColumnType::Json => String::from("json"),
            ColumnType::Custom(name) => with_length(name),
        }
    }

    fn modify_column(&self, name: &str, def: &ColumnDefinition) -> String {
        format!(
            "ALTER COLUMN {} TYPE {}",
            self.quote_identifier(name),
            self.column_type(def)
        )
    }

    fn index_name(&self, table: &str, base: &str) -> String {
        format!("{table}_{base}")
    }

    fn create_table_index(&self, table: &str, index: &IndexSpec) -> DdlClause {
        if index.unique {
            DdlClause::Inline(format!(
                "CONSTRAINT {} UNIQUE ({})",
                self.quote_identifier(&index.name),
                self.quote_identifier(&index.column)
            ))
        } else {
            self.create_index_statement(table, index)
        }
    }

    fn add_index(&self, table: &str, index: &IndexSpec) -> DdlClause {
        if index.unique {
            DdlClause::Inline(format!(
                "ADD CONSTRAINT {} UNIQUE ({})",
                self.quote_identifier(&index.name),
                self.quote_identifier(&index.column)
            ))
        } else {
            self.create_index_statement(table, index)
        }
    }

    fn drop_index(&self, _table: &str, name: &str, index: &LiveIndex) -> Option<DdlClause> {
        let name = self.quote_identifier(name);
        Some(match index.origin {
            IndexOrigin::Index => DdlClause::Standalone(format!("DROP INDEX {name}")),
            IndexOrigin::PrimaryKey | IndexOrigin::Constraint => {
                DdlClause::Inline(format!("DROP CONSTRAINT {name}"))
            }
        })
    }

    fn is_primary_index(&self, table: &str, name: &str) -> bool {
        name.strip_suffix("_pkey") == Some(table)
    }

    fn auto_populates_on_update(&self) -> bool {
        true
    }
}

impl PostgresDialect {
    fn create_index_statement(&self, table: &str, index: &IndexSpec) -> DdlClause {
        DdlClause::Standalone(format!(
            "CREATE INDEX {} ON {} ({})",
            self.quote_identifier(&index.name),
            self.quote_identifier(table),
            self.quote_identifier(&index.column)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialect() -> PostgresDialect {
        PostgresDialect::new()
    }

    #[test]
    fn test_paginate() {
        assert_eq!(dialect().paginate(5, 0), "LIMIT 5");
        assert_eq!(dialect().paginate(5, 15), "LIMIT 5 OFFSET 15");
    }

    #[test]
    fn test_insert_returning() {
        assert_eq!(
            dialect().insert_returning_clause("id").as_deref(),
            Some(" RETURNING \"id\"")
        );
    }

    #[test]
    fn test_serial_primary_key() {
        let def = ColumnDefinition::new(ColumnType::Bigint)
            .unsigned()
            .auto_increment()
            .primary();
        assert_eq!(
            dialect().column_definition("id", &def),
            "\"id\" BIGSERIAL PRIMARY KEY"
        );
    }

    #[test]
    fn test_no_unsigned_and_no_on_update() {
        let def = ColumnDefinition::new(ColumnType::Timestamp)
            .unsigned()
            .default_value("CURRENT_TIMESTAMP")
            .on_update("CURRENT_TIMESTAMP");
        assert_eq!(
            dialect().column_definition("updated_at", &def),
            "\"updated_at\" TIMESTAMP DEFAULT CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn test_type_signatures() {
        let varchar = ColumnDefinition::new(ColumnType::Varchar).length(64);
        assert!(dialect().types_match("character varying(64)", &varchar));
        assert!(dialect().types_match("boolean", &ColumnDefinition::new(ColumnType::Boolean)));
        assert!(!dialect().types_match("integer", &ColumnDefinition::new(ColumnType::Bigint)));
    }

    #[test]
    fn test_modify_column() {
        let def = ColumnDefinition::new(ColumnType::Varchar).length(128);
        assert_eq!(
            dialect().modify_column("name", &def),
            "ALTER COLUMN \"name\" TYPE VARCHAR(128)"
        );
    }

    #[test]
    fn test_full_text_query() {
        let tokens = vec!["red".to_string(), "c&ar".to_string()];
        assert_eq!(dialect().full_text_query(&tokens), "red:* & car:*");
        assert_eq!(
            dialect().full_text_match(&["\"a\"".into()], ":match_0_a"),
            "to_tsvector(concat_ws(' ', \"a\")) @@ to_tsquery(:match_0_a)"
        );
    }

    #[test]
    fn test_indexes_split_between_constraints_and_statements() {
        let unique = IndexSpec {
            name: "users_uniq_email".into(),
            column: "email".into(),
            unique: true,
        };
        let plain = IndexSpec {
            name: "users_idx_name".into(),
            column: "name".into(),
            unique: false,
        };
        assert_eq!(
            dialect().add_index("users", &unique),
            DdlClause::Inline("ADD CONSTRAINT \"users_uniq_email\" UNIQUE (\"email\")".into())
        );
        assert_eq!(
            dialect().add_index("users", &plain),
            DdlClause::Standalone(
                "CREATE INDEX \"users_idx_name\" ON \"users\" (\"name\")".into()
            )
        );
        assert_eq!(
            dialect().drop_index("users", "users_idx_name", &LiveIndex::new(["name"])),
            Some(DdlClause::Standalone("DROP INDEX \"users_idx_name\"".into()))
        );
        assert!(dialect().is_primary_index("users", "users_pkey"));
        assert!(!dialect().is_primary_index("users", "PRIMARY"));
    }

    #[test]
    fn test_drop_follows_live_index_origin() {
        let constraint = LiveIndex::new(["email"]).origin(IndexOrigin::Constraint);
        assert_eq!(
            dialect().drop_index("users", "users_email_key", &constraint),
            Some(DdlClause::Inline("DROP CONSTRAINT \"users_email_key\"".into()))
        );
        let unique_index = LiveIndex::new(["email"]).unique();
        assert_eq!(
            dialect().drop_index("users", "users_uniq_email", &unique_index),
            Some(DdlClause::Standalone("DROP INDEX \"users_uniq_email\"".into()))
        );
    }
}
