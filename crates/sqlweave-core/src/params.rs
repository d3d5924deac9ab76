//! Named placeholders and their bound values.
//!
//! Every value that reaches a statement goes through a [`ParameterBinder`],
//! which hands out placeholders of the form `:{purpose}_{n}_{column}`. The
//! counter `n` belongs to the binder, so two statements built by different
//! query builders never share state, while repeated calls on the same builder
//! never collide.

use std::collections::BTreeMap;

use crate::error::DriverError;
use crate::value::SqlValue;

/// Ordered placeholder → value map of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: Vec<(String, SqlValue)>,
    // Name to position in `values`; the first binding of a name wins.
    positions: BTreeMap<String, usize>,
}

impl ParameterSet {
    /// Creates an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: Vec::new(),
            positions: BTreeMap::new(),
        }
    }

    /// Adds `value` under `name` (without the leading colon).
    pub fn push(&mut self, name: impl Into<String>, value: SqlValue) {
        let name = name.into();
        let position = self.values.len();
        self.positions.entry(name.clone()).or_insert(position);
        self.values.push((name, value));
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        let name = name.strip_prefix(':').unwrap_or(name);
        let position = *self.positions.get(name)?;
        self.values.get(position).map(|(_, value)| value)
    }

    /// Iterates over name/value pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Substitutes every placeholder in `sql` with the literal rendering of
    /// its value.
    ///
    /// Only used for debug traces; unknown placeholders are left as-is.
    #[must_use]
    pub fn render_inline(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len());
        scan_placeholders(sql, |piece| match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Placeholder(name) => match self.get(name) {
                Some(value) => out.push_str(&value.to_sql_inline()),
                None => {
                    out.push(':');
                    out.push_str(name);
                }
            },
        });
        out
    }
}

/// Hands out collision-free placeholders and records their values.
#[derive(Debug, Default)]
pub struct ParameterBinder {
    counter: usize,
    params: ParameterSet,
}

impl ParameterBinder {
    /// Creates a binder with its counter at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: 0,
            params: ParameterSet::new(),
        }
    }

    /// Binds `value` for `column` and returns the placeholder, colon
    /// included.
    ///
    /// ```rust
    /// use sqlweave_core::params::ParameterBinder;
    ///
    /// let mut binder = ParameterBinder::new();
    /// assert_eq!(binder.bind("where", "age", 18), ":where_0_age");
    /// assert_eq!(binder.bind("where", "age", 65), ":where_1_age");
    /// ```
    pub fn bind(
        &mut self,
        purpose: &str,
        column: &str,
        value: impl crate::value::ToSqlValue,
    ) -> String {
        let name = format!("{purpose}_{}_{}", self.counter, sanitize(column));
        self.counter += 1;
        self.params.push(name.clone(), value.to_sql_value());
        format!(":{name}")
    }

    /// Binds one cell of a multi-row statement.
    pub fn bind_row(&mut self, row: usize, column: &str, value: SqlValue) -> String {
        self.bind(&format!("r{row}"), column, value)
    }

    /// Number of placeholders handed out so far.
    #[must_use]
    pub const fn issued(&self) -> usize {
        self.counter
    }

    /// Takes the values bound since the last call, keeping the counter.
    pub fn take(&mut self) -> ParameterSet {
        std::mem::take(&mut self.params)
    }
}

fn sanitize(column: &str) -> String {
    let cleaned: String = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        String::from("v")
    } else {
        cleaned
    }
}

/// Positional marker used by drivers that cannot bind by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` (SQLite, MySQL).
    Question,
    /// `$1`, `$2`, … (PostgreSQL).
    Dollar,
}

/// A statement rewritten to positional placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatement {
    sql: String,
    names: Vec<String>,
}

impl PreparedStatement {
    /// Rewrites the named placeholders of `sql` to `style`.
    ///
    /// Quoted regions (`'…'`, `"…"`, `` `…` ``) and `::` casts are left
    /// untouched.
    ///
    /// ```rust
    /// use sqlweave_core::params::{PlaceholderStyle, PreparedStatement};
    ///
    /// let stmt = PreparedStatement::positional(
    ///     "SELECT ':x' FROM t WHERE a = :a AND b::text = :b",
    ///     PlaceholderStyle::Dollar,
    /// );
    /// assert_eq!(stmt.sql(), "SELECT ':x' FROM t WHERE a = $1 AND b::text = $2");
    /// assert_eq!(stmt.names(), ["a", "b"]);
    /// ```
    #[must_use]
    pub fn positional(sql: &str, style: PlaceholderStyle) -> Self {
        let mut out = String::with_capacity(sql.len());
        let mut names = Vec::new();
        scan_placeholders(sql, |piece| match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Placeholder(name) => {
                names.push(name.to_string());
                match style {
                    PlaceholderStyle::Question => out.push('?'),
                    PlaceholderStyle::Dollar => {
                        out.push('$');
                        out.push_str(&names.len().to_string());
                    }
                }
            }
        });
        Self { sql: out, names }
    }

    /// Rewritten SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholder names in positional order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolves the positional values from `params`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::MissingParameter`] for a placeholder with no
    /// bound value.
    pub fn resolve<'p>(
        &self,
        params: &'p ParameterSet,
    ) -> Result<Vec<&'p SqlValue>, DriverError> {
        self.names
            .iter()
            .map(|name| {
                params
                    .get(name)
                    .ok_or_else(|| DriverError::MissingParameter(name.clone()))
            })
            .collect()
    }
}

enum Piece<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

fn scan_placeholders<'a>(sql: &'a str, mut emit: impl FnMut(Piece<'a>)) {
    let bytes = sql.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        // Doubled quote is an escaped quote.
                        if bytes.get(i + 1) == Some(&quote) {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
            b':' if bytes.get(i + 1).is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') => {
                let name_start = i + 1;
                let mut end = name_start;
                while bytes
                    .get(end)
                    .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
                {
                    end += 1;
                }
                if start < i {
                    emit(Piece::Text(&sql[start..i]));
                }
                emit(Piece::Placeholder(&sql[name_start..end]));
                start = end;
                i = end;
            }
            _ => i += 1,
        }
    }
    if start < sql.len() {
        emit(Piece::Text(&sql[start..]));
    }
}
