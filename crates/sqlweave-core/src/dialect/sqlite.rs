//! SQLite dialect.

use super::{clean_token, default_clause, DdlClause, Dialect};
use crate::driver::{IndexOrigin, LiveIndex};
use crate::reconcile::IndexSpec;
use crate::schema::{ColumnDefinition, ColumnType};

const LIKE_WILDCARDS: &[char] = &['%', '_'];

/// SQLite dialect.
///
/// SQLite keeps the declared type text of a column and reports it back
/// verbatim, so type signatures are the declared types in lowercase.
/// Indexes are always separate statements, and `ALTER TABLE` takes one
/// clause at a time and cannot change a column type.
///
/// `REGEXP` only works on connections that register a `regexp()` function.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
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

    fn null_safe_equals(&self) -> &'static str {
        "IS"
    }

    fn regex_match(&self, expression: &str, pattern: &str) -> String {
        format!("LOWER({expression}) REGEXP LOWER({pattern})")
    }

    // No full-text index outside FTS virtual tables: every token must
    // appear, in order, in the concatenated columns.
    fn full_text_match(&self, columns: &[String], query: &str) -> String {
        let haystack = columns
            .iter()
            .map(|column| format!("COALESCE({column}, '')"))
            .collect::<Vec<_>>()
            .join(" || ' ' || ");
        format!("({haystack}) LIKE {query}")
    }

    fn full_text_query(&self, tokens: &[String]) -> String {
        let tokens: Vec<String> = tokens
            .iter()
            .map(|token| clean_token(token, LIKE_WILDCARDS))
            .filter(|token| !token.is_empty())
            .collect();
        if tokens.is_empty() {
            String::new()
        } else {
            format!("%{}%", tokens.join("%"))
        }
    }

    fn json_contains(&self, column: &str, document: &str) -> String {
        format!(
            "NOT EXISTS (SELECT 1 FROM json_each({document}) AS wanted \
             WHERE wanted.value NOT IN (SELECT value FROM json_each({column})))"
        )
    }

    fn truncate(&self, table: &str) -> String {
        format!("DELETE FROM {table}")
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
            ColumnType::Text | ColumnType::Json => String::from("TEXT"),
            ColumnType::Tinyint => String::from("TINYINT"),
            ColumnType::Smallint => String::from("SMALLINT"),
            ColumnType::Int => String::from("INTEGER"),
            ColumnType::Bigint => String::from("BIGINT"),
            ColumnType::Boolean => String::from("BOOLEAN"),
            ColumnType::Float => String::from("REAL"),
            ColumnType::Double => String::from("DOUBLE"),
            ColumnType::Decimal => with_length("DECIMAL"),
            ColumnType::Date => String::from("DATE"),
            ColumnType::Datetime => String::from("DATETIME"),
            ColumnType::Timestamp => String::from("TIMESTAMP"),
            ColumnType::Custom(name) => with_length(&name.to_ascii_uppercase()),
        }
    }

    fn column_definition(&self, name: &str, def: &ColumnDefinition) -> String {
        let name = self.quote_identifier(name);
        // Only this exact spelling aliases the rowid.
        if def.auto_increment {
            return format!("{name} INTEGER PRIMARY KEY AUTOINCREMENT");
        }
        let mut sql = format!("{name} {}", self.column_type(def));
        sql.push_str(&default_clause(def));
        if def.primary {
            sql.push_str(" PRIMARY KEY");
        }
        sql
    }

    fn type_signature(&self, def: &ColumnDefinition) -> String {
        self.column_type(def).to_ascii_lowercase()
    }

    fn types_match(&self, reported: &str, def: &ColumnDefinition) -> bool {
        normalize_reported(reported) == self.type_signature(def)
    }

    fn modify_column(&self, name: &str, def: &ColumnDefinition) -> String {
        format!(
            "ALTER COLUMN {} TYPE {}",
            self.quote_identifier(name),
            self.column_type(def)
        )
    }

    fn alters_column_types(&self) -> bool {
        false
    }

    fn batches_alter_clauses(&self) -> bool {
        false
    }

    fn index_name(&self, table: &str, base: &str) -> String {
        format!("{table}_{base}")
    }

    fn create_table_index(&self, table: &str, index: &IndexSpec) -> DdlClause {
        self.add_index(table, index)
    }

    fn add_index(&self, table: &str, index: &IndexSpec) -> DdlClause {
        let kind = if index.unique { "UNIQUE INDEX" } else { "INDEX" };
        DdlClause::Standalone(format!(
            "CREATE {kind} {} ON {} ({})",
            self.quote_identifier(&index.name),
            self.quote_identifier(table),
            self.quote_identifier(&index.column)
        ))
    }

    fn drop_index(&self, _table: &str, name: &str, index: &LiveIndex) -> Option<DdlClause> {
        match index.origin {
            IndexOrigin::Index => Some(DdlClause::Standalone(format!(
                "DROP INDEX {}",
                self.quote_identifier(name)
            ))),
            IndexOrigin::PrimaryKey | IndexOrigin::Constraint => None,
        }
    }

    fn is_primary_index(&self, _table: &str, _name: &str) -> bool {
        false
    }

    fn auto_populates_on_update(&self) -> bool {
        true
    }
}

// Declared types come back as written: `VARCHAR (255)`, `decimal(10, 2)`.
fn normalize_reported(reported: &str) -> String {
    let lower = reported.trim().to_ascii_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut pending_space = false;
    for c in lower.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !matches!(c, '(' | ')' | ',') && !out.ends_with(['(', ',']) {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    out
}
