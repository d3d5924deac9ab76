//! SELECT and COUNT.

use super::QueryBuilder;
use crate::dialect::Dialect;
use crate::driver::Driver;
use crate::error::Result;
use crate::schema::{ColumnType, TableSchema};
use crate::value::{Row, SqlValue};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    All,
    List(Vec<String>),
    Raw(String),
}

/// Column selection of a `SELECT`.
///
/// A list of names is quoted; raw text is emitted verbatim. Aliases map a
/// column to its output name (`col AS alias`); with `reversed` the map is
/// read the other way round (`alias AS col`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    selection: Selection,
    aliases: Vec<(String, String)>,
    reversed: bool,
}

impl Columns {
    /// Selects every column (`*`).
    #[must_use]
    pub const fn all() -> Self {
        Self {
            selection: Selection::All,
            aliases: Vec::new(),
            reversed: false,
        }
    }

    /// Selects the named columns.
    pub fn list<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        Self {
            selection: if columns.is_empty() {
                Selection::All
            } else {
                Selection::List(columns)
            },
            ..Self::all()
        }
    }

    /// Selects a raw column expression.
    #[must_use]
    pub fn raw(expression: impl Into<String>) -> Self {
        let expression = expression.into();
        Self {
            selection: if expression.trim().is_empty() {
                Selection::All
            } else {
                Selection::Raw(expression)
            },
            ..Self::all()
        }
    }

    /// Renames `column` to `alias` in the output.
    #[must_use]
    pub fn alias(mut self, column: impl Into<String>, alias: impl Into<String>) -> Self {
        self.aliases.push((column.into(), alias.into()));
        self
    }

    /// Reads the alias map as output name → source column.
    #[must_use]
    pub const fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }

    fn render(&self, dialect: &dyn Dialect) -> String {
        let mut sql = match &self.selection {
            Selection::All => return String::from("*"),
            Selection::List(columns) => columns
                .iter()
                .map(|column| dialect.quote_identifier(column))
                .collect::<Vec<_>>()
                .join(","),
            Selection::Raw(expression) => expression.clone(),
        };
        for (key, alias) in &self.aliases {
            let quoted_key = dialect.quote_identifier(key);
            let quoted_alias = dialect.quote_identifier(alias);
            let replacement = if self.reversed {
                format!("{quoted_alias} AS {quoted_key}")
            } else {
                format!("{quoted_key} AS {quoted_alias}")
            };
            sql = sql.replace(&quoted_key, &replacement);
        }
        sql
    }
}

impl Default for Columns {
    fn default() -> Self {
        Self::all()
    }
}

impl From<&str> for Columns {
    fn from(expression: &str) -> Self {
        Self::raw(expression)
    }
}

impl From<Vec<&str>> for Columns {
    fn from(columns: Vec<&str>) -> Self {
        Self::list(columns)
    }
}

impl From<Vec<String>> for Columns {
    fn from(columns: Vec<String>) -> Self {
        Self::list(columns)
    }
}

impl<const N: usize> From<[&str; N]> for Columns {
    fn from(columns: [&str; N]) -> Self {
        Self::list(columns)
    }
}

impl From<&[&str]> for Columns {
    fn from(columns: &[&str]) -> Self {
        Self::list(columns.iter().copied())
    }
}

impl<D: Driver> QueryBuilder<'_, D> {
    /// Runs a `SELECT` with the accumulated clauses.
    ///
    /// Values of schema columns are coerced: `boolean` to
    /// [`SqlValue::Bool`], `json` to [`SqlValue::Json`] (an empty object when
    /// the stored text is not valid JSON) and integer types to
    /// [`SqlValue::Int`].
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the statement.
    pub fn select(&mut self, columns: impl Into<Columns>) -> Result<Vec<Row>> {
        let clauses = self.take_clauses();
        let mut sql = format!(
            "SELECT {} FROM {}",
            columns.into().render(self.dialect),
            self.quoted_table()
        );
        sql.push_str(&self.render_tail(&clauses));
        let params = self.binder.take();
        let execution = self.dispatch(&sql, &params)?;
        Ok(execution
            .rows
            .into_iter()
            .map(|row| coerce_row(&self.schema, row))
            .collect())
    }

    /// Runs a `SELECT` and returns the first row.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the statement.
    pub fn select_one(&mut self, columns: impl Into<Columns>) -> Result<Option<Row>> {
        Ok(self.select(columns)?.into_iter().next())
    }

    /// Counts the rows matching the accumulated clauses. `column` is `*` or
    /// a column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the statement.
    pub fn count(&mut self, column: &str) -> Result<i64> {
        let clauses = self.take_clauses();
        let target = if column.trim().is_empty() || column == "*" {
            String::from("*")
        } else {
            self.dialect.quote_identifier(column)
        };
        let mut sql = format!(
            "SELECT COUNT({target}) AS count_items FROM {}",
            self.quoted_table()
        );
        sql.push_str(&self.render_tail(&clauses));
        let params = self.binder.take();
        let execution = self.dispatch(&sql, &params)?;
        Ok(execution
            .rows
            .first()
            .and_then(|row| row.get("count_items"))
            .and_then(integer_value)
            .unwrap_or(0))
    }
}

pub(super) fn coerce_row(schema: &TableSchema, mut row: Row) -> Row {
    for (column, value) in row.iter_mut() {
        if value.is_null() {
            continue;
        }
        let Some(def) = schema.get(column) else {
            continue;
        };
        let coerced = match def.column_type {
            ColumnType::Boolean => Some(SqlValue::Bool(value.truthy())),
            ColumnType::Json => Some(json_value(value)),
            ColumnType::Tinyint | ColumnType::Smallint | ColumnType::Int | ColumnType::Bigint => {
                integer_value(value).map(SqlValue::Int)
            }
            _ => None,
        };
        if let Some(coerced) = coerced {
            *value = coerced;
        }
    }
    row
}

fn json_value(value: &SqlValue) -> SqlValue {
    let empty = || SqlValue::Json(serde_json::Value::Object(serde_json::Map::new()));
    match value {
        SqlValue::Json(json) => SqlValue::Json(json.clone()),
        SqlValue::Text(text) => {
            serde_json::from_str(text).map_or_else(|_| empty(), SqlValue::Json)
        }
        SqlValue::Blob(bytes) => {
            serde_json::from_slice(bytes).map_or_else(|_| empty(), SqlValue::Json)
        }
        _ => empty(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer_value(value: &SqlValue) -> Option<i64> {
    match value {
        SqlValue::Int(n) => Some(*n),
        SqlValue::Bool(b) => Some(i64::from(*b)),
        SqlValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        SqlValue::Text(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect};
    use crate::schema::ColumnDefinition;

    #[test]
    fn test_columns_rendering() {
        let mysql = MySqlDialect::new();
        assert_eq!(Columns::all().render(&mysql), "*");
        assert_eq!(Columns::from(["id", "name"]).render(&mysql), "`id`,`name`");
        assert_eq!(Columns::from("COUNT(*) AS n").render(&mysql), "COUNT(*) AS n");
        assert_eq!(Columns::from(Vec::<&str>::new()).render(&mysql), "*");
    }

    #[test]
    fn test_column_aliases() {
        let pg = PostgresDialect::new();
        let columns = Columns::from(["id", "name"]).alias("name", "label");
        assert_eq!(columns.render(&pg), "\"id\",\"name\" AS \"label\"");
        let reversed = Columns::from(["id", "label"]).alias("label", "name").reversed();
        assert_eq!(reversed.render(&pg), "\"id\",\"name\" AS \"label\"");
    }

    #[test]
    fn test_row_coercion() {
        let schema = TableSchema::new()
            .column("active", ColumnDefinition::new(ColumnType::Boolean))
            .column("meta", ColumnDefinition::new(ColumnType::Json))
            .column("broken", ColumnDefinition::new(ColumnType::Json))
            .column("age", ColumnDefinition::new(ColumnType::Int))
            .column("gone", ColumnDefinition::new(ColumnType::Json));
        let row = Row::new()
            .set("active", 1)
            .set("meta", r#"{"a": [1, 2]}"#)
            .set("broken", "{not json")
            .set("age", "42")
            .set("gone", SqlValue::Null)
            .set("extra", "untouched");
        let row = coerce_row(&schema, row);
        assert_eq!(row.get("active"), Some(&SqlValue::Bool(true)));
        assert_eq!(
            row.get("meta"),
            Some(&SqlValue::Json(serde_json::json!({"a": [1, 2]})))
        );
        assert_eq!(
            row.get("broken"),
            Some(&SqlValue::Json(serde_json::json!({})))
        );
        assert_eq!(row.get("age"), Some(&SqlValue::Int(42)));
        assert_eq!(row.get("gone"), Some(&SqlValue::Null));
        assert_eq!(row.get("extra"), Some(&SqlValue::Text("untouched".into())));
    }
}
