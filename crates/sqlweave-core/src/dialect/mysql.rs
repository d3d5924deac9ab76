//! MySQL / MariaDB dialect.

use super::{clean_token, default_clause, DdlClause, Dialect};
use crate::driver::LiveIndex;
use crate::reconcile::IndexSpec;
use crate::schema::{ColumnDefinition, ColumnType};

const BOOLEAN_MODE_OPERATORS: &[char] = &['+', '-', '<', '>', '(', ')', '~', '*', '"', '@'];

// Precision MySQL assigns to a `DECIMAL` declared without one.
const DEFAULT_DECIMAL_PRECISION: u32 = 10;

/// MySQL dialect. This is the default dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn paginate(&self, limit: u64, offset: u64) -> String {
        if offset == 0 {
            format!("LIMIT {limit}")
        } else {
            format!("LIMIT {offset},{limit}")
        }
    }

    fn random_order_expression(&self) -> &'static str {
        "RAND()"
    }

    fn regex_match(&self, expression: &str, pattern: &str) -> String {
        format!("LOWER({expression}) REGEXP LOWER({pattern})")
    }

    fn full_text_match(&self, columns: &[String], query: &str) -> String {
        format!("MATCH ({}) AGAINST ({query} IN BOOLEAN MODE)", columns.join(","))
    }

    fn full_text_query(&self, tokens: &[String]) -> String {
        tokens
            .iter()
            .map(|token| clean_token(token, BOOLEAN_MODE_OPERATORS))
            .filter(|token| !token.is_empty())
            .map(|token| format!("+{token}*"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn json_contains(&self, column: &str, document: &str) -> String {
        format!("JSON_CONTAINS({column}, {document})")
    }

    fn column_type(&self, def: &ColumnDefinition) -> String {
        let mut sql = match def.column_type {
            ColumnType::Boolean => String::from("TINYINT(1)"),
            _ if def.length > 0 => {
                format!("{}({})", def.column_type.name().to_ascii_uppercase(), def.length)
            }
            _ => def.column_type.name().to_ascii_uppercase(),
        };
        if def.unsigned {
            sql.push_str(" UNSIGNED");
        }
        sql
    }

    fn column_definition(&self, name: &str, def: &ColumnDefinition) -> String {
        let mut sql = format!("{} {}", self.quote_identifier(name), self.column_type(def));
        if def.auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        }
        sql.push_str(&default_clause(def));
        let on_update = def.on_update.trim();
        if !on_update.is_empty() {
            sql.push_str(" ON UPDATE ");
            sql.push_str(on_update);
        }
        if def.primary {
            sql.push_str(" PRIMARY KEY");
        }
        sql
    }

    fn type_signature(&self, def: &ColumnDefinition) -> String {
        let mut signature = match def.column_type {
            ColumnType::Boolean => String::from("tinyint(1)"),
            ColumnType::Tinyint if def.length == 1 => String::from("tinyint(1)"),
            // Reported with its scale, which column definitions never set.
            ColumnType::Decimal => {
                let precision = if def.length > 0 {
                    def.length
                } else {
                    DEFAULT_DECIMAL_PRECISION
                };
                format!("decimal({precision},0)")
            }
            _ if def.column_type.is_integer() || def.length == 0 => {
                def.column_type.name().to_string()
            }
            _ => format!("{}({})", def.column_type.name(), def.length),
        };
        if def.unsigned {
            signature.push_str(" unsigned");
        }
        signature
    }

    fn types_match(&self, reported: &str, def: &ColumnDefinition) -> bool {
        normalize_reported(reported) == self.type_signature(def)
    }

    fn modify_column(&self, name: &str, def: &ColumnDefinition) -> String {
        format!("MODIFY COLUMN {}", self.column_definition(name, def))
    }

    fn create_table_index(&self, _table: &str, index: &IndexSpec) -> DdlClause {
        let kind = if index.unique { "UNIQUE" } else { "INDEX" };
        DdlClause::Inline(format!(
            "{kind} {} ({})",
            self.quote_identifier(&index.name),
            self.quote_identifier(&index.column)
        ))
    }

    fn add_index(&self, _table: &str, index: &IndexSpec) -> DdlClause {
        let kind = if index.unique { "UNIQUE" } else { "INDEX" };
        DdlClause::Inline(format!(
            "ADD {kind} {} ({})",
            self.quote_identifier(&index.name),
            self.quote_identifier(&index.column)
        ))
    }

    fn drop_index(&self, _table: &str, name: &str, _index: &LiveIndex) -> Option<DdlClause> {
        Some(DdlClause::Inline(format!(
            "DROP INDEX {}",
            self.quote_identifier(name)
        )))
    }

    fn is_primary_index(&self, _table: &str, name: &str) -> bool {
        name.eq_ignore_ascii_case("PRIMARY")
    }
}

// MySQL 8 stops reporting integer display widths, older servers still do.
// Both forms compare equal, except the boolean marker `tinyint(1)`.
fn normalize_reported(reported: &str) -> String {
    let lower = reported.trim().to_ascii_lowercase();
    let (base, rest) = lower.split_once(' ').unwrap_or((lower.as_str(), ""));
    let base = match base.split_once('(') {
        Some((name, _)) if base != "tinyint(1)" && is_integer_name(name) => name,
        _ => base,
    };
    let unsigned = rest.split_whitespace().any(|word| word == "unsigned");
    if unsigned {
        format!("{base} unsigned")
    } else {
        base.to_string()
    }
}

fn is_integer_name(name: &str) -> bool {
    matches!(name, "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint")
}
