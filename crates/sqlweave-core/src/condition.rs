//! WHERE clause construction.
//!
//! Conditions are collected as a flat token stream of predicates,
//! connectives and group markers. Nothing is rendered until the statement is
//! finalized, at which point every operand is bound through the query's
//! [`ParameterBinder`] and every identifier is quoted by the dialect.
//!
//! Malformed input never fails: an unknown operator, an empty `IN` list, a
//! `BETWEEN` without two bounds or a `MATCH` without a phrase simply adds
//! no condition.

use tracing::trace;

use crate::dialect::{coerce_for_column, Dialect};
use crate::params::ParameterBinder;
use crate::schema::TableSchema;
use crate::value::{SqlValue, ToSqlValue};

/// Logical connective between two conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connective {
    /// `AND`
    #[default]
    And,
    /// `OR`
    Or,
}

impl Connective {
    /// Parses a connective; anything other than `or` is `AND`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("or") {
            Self::Or
        } else {
            Self::And
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// How a full-text search is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FullTextMode {
    /// Case-insensitive regular expression over every column.
    #[default]
    Regex,
    /// The backend's full-text index.
    Boolean,
}

/// Kind of a pattern predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// Regular expression match.
    Regexp,
}

/// Recognized condition operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Binary comparison: `=`, `!=`, `<>`, `<`, `<=`, `>`, `>=`, `<=>`.
    Compare(&'static str),
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
    /// `BETWEEN`
    Between,
    /// `LIKE`, `NOT LIKE` or `REGEXP`.
    Pattern(PatternKind),
    /// `IS NULL` (also `NULL`).
    IsNull,
    /// `IS NOT NULL` (also `NOT NULL`).
    IsNotNull,
    /// Full-text `MATCH` over comma separated columns.
    Match,
    /// Raw SQL (`CUSTOM` or `RAW`).
    Raw,
    /// `EXISTS`
    Exists,
    /// `NOT EXISTS`
    NotExists,
    /// `JSON_CONTAINS`
    JsonContains,
    /// `LENGTH>`, `LENGTH<` or `LENGTH=`.
    Length(&'static str),
}

impl Operator {
    /// Parses an operator, ignoring case and surrounding whitespace.
    ///
    /// ```rust
    /// use sqlweave_core::condition::Operator;
    ///
    /// assert_eq!(Operator::parse(" not in "), Some(Operator::NotIn));
    /// assert_eq!(Operator::parse(">="), Some(Operator::Compare(">=")));
    /// assert_eq!(Operator::parse("SOUNDS LIKE"), None);
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let upper = text.trim().to_ascii_uppercase();
        let op = match upper.as_str() {
            "=" => Self::Compare("="),
            "!=" => Self::Compare("!="),
            "<>" => Self::Compare("<>"),
            "<" => Self::Compare("<"),
            "<=" => Self::Compare("<="),
            ">" => Self::Compare(">"),
            ">=" => Self::Compare(">="),
            "<=>" => Self::Compare("<=>"),
            "IN" => Self::In,
            "NOT IN" => Self::NotIn,
            "BETWEEN" => Self::Between,
            "LIKE" => Self::Pattern(PatternKind::Like),
            "NOT LIKE" => Self::Pattern(PatternKind::NotLike),
            "REGEXP" => Self::Pattern(PatternKind::Regexp),
            "NULL" | "IS NULL" => Self::IsNull,
            "NOT NULL" | "IS NOT NULL" => Self::IsNotNull,
            "MATCH" => Self::Match,
            "CUSTOM" | "RAW" => Self::Raw,
            "EXISTS" => Self::Exists,
            "NOT EXISTS" => Self::NotExists,
            "JSON_CONTAINS" => Self::JsonContains,
            "LENGTH>" => Self::Length(">"),
            "LENGTH<" => Self::Length("<"),
            "LENGTH=" => Self::Length("="),
            _ => return None,
        };
        Some(op)
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Operand {
    /// No operand (`IS NULL`, `RAW`, `EXISTS`).
    #[default]
    None,
    /// A single value.
    Value(SqlValue),
    /// A list of values (`IN`, `BETWEEN`).
    List(Vec<SqlValue>),
}

impl Operand {
    /// Builds a list operand.
    pub fn list<T: ToSqlValue>(values: impl IntoIterator<Item = T>) -> Self {
        Self::List(values.into_iter().map(ToSqlValue::to_sql_value).collect())
    }

    fn into_values(self) -> Vec<SqlValue> {
        match self {
            Self::None => Vec::new(),
            Self::Value(value) => vec![value],
            Self::List(values) => values,
        }
    }
}

macro_rules! operand_from_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Self::Value(value.to_sql_value())
                }
            }
        )*
    };
}

operand_from_value!(
    SqlValue,
    bool,
    i64,
    i32,
    i16,
    i8,
    u32,
    u16,
    u8,
    f64,
    f32,
    String,
    &str,
    &String,
    serde_json::Value
);

impl<T: ToSqlValue> From<Option<T>> for Operand {
    fn from(value: Option<T>) -> Self {
        Self::Value(value.to_sql_value())
    }
}

impl<T: ToSqlValue> From<Vec<T>> for Operand {
    fn from(values: Vec<T>) -> Self {
        Self::list(values)
    }
}

impl<T: ToSqlValue, const N: usize> From<[T; N]> for Operand {
    fn from(values: [T; N]) -> Self {
        Self::list(values)
    }
}

impl From<()> for Operand {
    fn from((): ()) -> Self {
        Self::None
    }
}

/// A single predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column op value`
    Comparison {
        /// Column name.
        column: String,
        /// Comparison symbol.
        op: &'static str,
        /// Bound value.
        value: SqlValue,
    },
    /// `column [NOT] IN (values…)`
    SetMembership {
        /// Column name.
        column: String,
        /// `NOT IN` when set.
        negated: bool,
        /// Bound values, never empty.
        values: Vec<SqlValue>,
    },
    /// `column BETWEEN low AND high`
    Range {
        /// Column name.
        column: String,
        /// Lower bound.
        low: SqlValue,
        /// Upper bound.
        high: SqlValue,
    },
    /// `column LIKE pattern` and friends.
    Pattern {
        /// Column name.
        column: String,
        /// Pattern kind.
        kind: PatternKind,
        /// Bound pattern.
        pattern: SqlValue,
    },
    /// `column IS [NOT] NULL`
    NullCheck {
        /// Column name.
        column: String,
        /// `IS NOT NULL` when set.
        negated: bool,
    },
    /// Search of `tokens` over `columns`.
    FullText {
        /// Searched columns.
        columns: Vec<String>,
        /// Search tokens, never empty.
        tokens: Vec<String>,
        /// Matching mode.
        mode: FullTextMode,
    },
    /// Caller-supplied SQL, emitted verbatim.
    Raw(String),
    /// `[NOT] EXISTS (subquery)`, emitted verbatim.
    Existence {
        /// `NOT EXISTS` when set.
        negated: bool,
        /// Subquery text.
        subquery: String,
    },
    /// JSON containment.
    JsonContains {
        /// Column name.
        column: String,
        /// JSON document the column must contain.
        document: SqlValue,
    },
    /// `LENGTH(column) op value`
    Length {
        /// Column name.
        column: String,
        /// Comparison symbol.
        op: &'static str,
        /// Bound length.
        value: SqlValue,
    },
}

impl Condition {
    /// Builds a condition from a column (or raw text), an operator and an
    /// operand. Returns `None` for anything malformed.
    #[must_use]
    pub fn build(column: &str, operator: &str, operand: Operand) -> Option<Self> {
        let Some(op) = Operator::parse(operator) else {
            trace!(column, operator, "Skipping condition with unknown operator");
            return None;
        };
        let condition = Self::from_operator(column, op, operand);
        if condition.is_none() {
            trace!(column, operator, "Skipping malformed condition");
        }
        condition
    }

    fn from_operator(column: &str, op: Operator, operand: Operand) -> Option<Self> {
        let column_name = column.trim().to_string();
        match op {
            Operator::Compare(symbol) => match operand {
                Operand::Value(value) => Some(Self::Comparison {
                    column: column_name,
                    op: symbol,
                    value,
                }),
                _ => None,
            },
            Operator::In | Operator::NotIn => {
                let values = operand.into_values();
                (!values.is_empty()).then(|| Self::SetMembership {
                    column: column_name,
                    negated: op == Operator::NotIn,
                    values,
                })
            }
            Operator::Between => match operand {
                Operand::List(values) if values.len() == 2 => {
                    let mut bounds = values.into_iter();
                    let low = bounds.next()?;
                    let high = bounds.next()?;
                    Some(Self::Range {
                        column: column_name,
                        low,
                        high,
                    })
                }
                _ => None,
            },
            Operator::Pattern(kind) => match operand {
                Operand::Value(pattern) if !pattern.is_null() => Some(Self::Pattern {
                    column: column_name,
                    kind,
                    pattern,
                }),
                _ => None,
            },
            Operator::IsNull | Operator::IsNotNull => Some(Self::NullCheck {
                column: column_name,
                negated: op == Operator::IsNotNull,
            }),
            Operator::Match => {
                let columns = split_columns(column);
                let phrase = match operand {
                    Operand::Value(SqlValue::Text(phrase)) => phrase,
                    _ => return None,
                };
                Self::full_text(columns, &phrase, true, FullTextMode::Boolean)
            }
            Operator::Raw => (!column_name.is_empty()).then_some(Self::Raw(column_name)),
            Operator::Exists | Operator::NotExists => {
                (!column_name.is_empty()).then(|| Self::Existence {
                    negated: op == Operator::NotExists,
                    subquery: column_name,
                })
            }
            Operator::JsonContains => {
                let document = match operand {
                    Operand::None => return None,
                    Operand::Value(value) => json_document(value),
                    Operand::List(values) => {
                        let items = values.into_iter().map(json_item).collect();
                        SqlValue::Text(serde_json::Value::Array(items).to_string())
                    }
                };
                Some(Self::JsonContains {
                    column: column_name,
                    document,
                })
            }
            Operator::Length(symbol) => match operand {
                Operand::Value(value) if !value.is_null() => Some(Self::Length {
                    column: column_name,
                    op: symbol,
                    value,
                }),
                _ => None,
            },
        }
    }

    /// Builds a full-text condition. Returns `None` without columns or
    /// without a usable token.
    #[must_use]
    pub fn full_text(
        columns: Vec<String>,
        phrase: &str,
        explode_words: bool,
        mode: FullTextMode,
    ) -> Option<Self> {
        let tokens: Vec<String> = if explode_words {
            phrase.split_whitespace().map(str::to_string).collect()
        } else {
            vec![phrase.trim().to_string()]
        };
        let tokens: Vec<String> = tokens
            .into_iter()
            .filter(|token| token.chars().any(char::is_alphanumeric))
            .collect();
        if columns.is_empty() || tokens.is_empty() {
            return None;
        }
        Some(Self::FullText {
            columns,
            tokens,
            mode,
        })
    }

    /// Renders the condition, binding its operands.
    pub fn render(&self, ctx: &mut RenderContext<'_>) -> String {
        match self {
            Self::Comparison { column, op, value } => {
                let placeholder = ctx.bind("where", column, value.clone());
                let op: &str = if *op == "<=>" {
                    ctx.dialect.null_safe_equals()
                } else {
                    op
                };
                format!("{} {op} {placeholder}", ctx.quote(column))
            }
            Self::SetMembership {
                column,
                negated,
                values,
            } => {
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|value| ctx.bind("in", column, value.clone()))
                    .collect();
                let keyword = if *negated { "NOT IN" } else { "IN" };
                format!("{} {keyword} ({})", ctx.quote(column), placeholders.join(","))
            }
            Self::Range { column, low, high } => {
                let low = ctx.bind("bw", column, low.clone());
                let high = ctx.bind("bw", column, high.clone());
                format!("({} BETWEEN {low} AND {high})", ctx.quote(column))
            }
            Self::Pattern {
                column,
                kind,
                pattern,
            } => {
                let placeholder = ctx.bind("like", column, pattern.clone());
                let quoted = ctx.quote(column);
                match kind {
                    PatternKind::Like => format!("{quoted} LIKE {placeholder}"),
                    PatternKind::NotLike => format!("{quoted} NOT LIKE {placeholder}"),
                    PatternKind::Regexp => ctx.dialect.regexp(&quoted, &placeholder),
                }
            }
            Self::NullCheck { column, negated } => {
                let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
                format!("{} {keyword}", ctx.quote(column))
            }
            Self::FullText {
                columns,
                tokens,
                mode,
            } => render_full_text(ctx, columns, tokens, *mode),
            Self::Raw(sql) => sql.clone(),
            Self::Existence { negated, subquery } => {
                let keyword = if *negated { "NOT EXISTS" } else { "EXISTS" };
                if subquery.starts_with('(') {
                    format!("{keyword} {subquery}")
                } else {
                    format!("{keyword} ({subquery})")
                }
            }
            Self::JsonContains { column, document } => {
                let placeholder = ctx.binder.bind("json", column, document.clone());
                ctx.dialect.json_contains(&ctx.quote(column), &placeholder)
            }
            Self::Length { column, op, value } => {
                let placeholder = ctx.binder.bind("len", column, value.clone());
                format!("LENGTH({}) {op} {placeholder}", ctx.quote(column))
            }
        }
    }
}

fn render_full_text(
    ctx: &mut RenderContext<'_>,
    columns: &[String],
    tokens: &[String],
    mode: FullTextMode,
) -> String {
    let first = columns.first().map_or("", String::as_str);
    match mode {
        FullTextMode::Regex => {
            let pattern = tokens
                .iter()
                .map(|token| escape_regex(token))
                .collect::<Vec<_>>()
                .join("|");
            let terms: Vec<String> = columns
                .iter()
                .map(|column| {
                    let placeholder = ctx.binder.bind("search", column, pattern.as_str());
                    format!("({})", ctx.dialect.regex_match(&ctx.quote(column), &placeholder))
                })
                .collect();
            format!("({})", terms.join(" OR "))
        }
        FullTextMode::Boolean => {
            let query = ctx.dialect.full_text_query(tokens);
            let placeholder = ctx.binder.bind("match", first, query);
            let quoted: Vec<String> = columns.iter().map(|column| ctx.quote(column)).collect();
            format!("({})", ctx.dialect.full_text_match(&quoted, &placeholder))
        }
    }
}

fn split_columns(columns: &str) -> Vec<String> {
    columns
        .split(',')
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .map(str::to_string)
        .collect()
}

fn escape_regex(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len());
    for c in token.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn json_item(value: SqlValue) -> serde_json::Value {
    match value {
        SqlValue::Null => serde_json::Value::Null,
        SqlValue::Bool(b) => serde_json::Value::Bool(b),
        SqlValue::Int(n) => serde_json::Value::from(n),
        SqlValue::Float(f) => serde_json::Value::from(f),
        SqlValue::Text(s) => serde_json::Value::String(s),
        SqlValue::Blob(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        SqlValue::Json(json) => json,
    }
}

// Text is taken as an already encoded document.
fn json_document(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(text) => SqlValue::Text(text),
        other => SqlValue::Text(json_item(other).to_string()),
    }
}

/// Everything a condition needs to render itself.
pub struct RenderContext<'a> {
    /// Dialect used for quoting and predicate shapes.
    pub dialect: &'a dyn Dialect,
    /// Schema of the queried table.
    pub schema: &'a TableSchema,
    /// Binder of the statement being built.
    pub binder: &'a mut ParameterBinder,
}

impl RenderContext<'_> {
    fn quote(&self, column: &str) -> String {
        self.dialect.quote_identifier(column)
    }

    fn bind(&mut self, purpose: &str, column: &str, value: SqlValue) -> String {
        let value = coerce_for_column(self.dialect, self.schema, column, value);
        self.binder.bind(purpose, column, value)
    }
}

/// One entry of [`ConditionBuilder::add_group`].
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Column name or raw text.
    pub column: String,
    /// Operator text.
    pub operator: String,
    /// Operand.
    pub operand: Operand,
    /// Connective to the previous predicate of the group.
    pub connective: Connective,
}

impl Predicate {
    /// Creates a predicate joined to the previous one with `AND`.
    pub fn new(
        column: impl Into<String>,
        operator: impl Into<String>,
        operand: impl Into<Operand>,
    ) -> Self {
        Self {
            column: column.into(),
            operator: operator.into(),
            operand: operand.into(),
            connective: Connective::And,
        }
    }

    /// Joins this predicate to the previous one with `OR`.
    #[must_use]
    pub const fn or(mut self) -> Self {
        self.connective = Connective::Or;
        self
    }
}

impl<C: Into<String>, O: Into<String>, V: Into<Operand>> From<(C, O, V)> for Predicate {
    fn from((column, operator, operand): (C, O, V)) -> Self {
        Self::new(column, operator, operand)
    }
}

impl<C: Into<String>, O: Into<String>, V: Into<Operand>> From<(C, O, V, &str)> for Predicate {
    fn from((column, operator, operand, connective): (C, O, V, &str)) -> Self {
        let mut predicate = Self::new(column, operator, operand);
        predicate.connective = Connective::parse(connective);
        predicate
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Condition(Condition),
    Connective(Connective),
    Open,
    Close,
}

/// Accumulates conditions for one WHERE clause.
#[derive(Debug, Clone, Default)]
pub struct ConditionBuilder {
    tokens: Vec<Token>,
}

impl ConditionBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Returns `true` if no condition was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.tokens.iter().any(|token| matches!(token, Token::Condition(_)))
    }

    /// Removes every condition.
    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Adds `condition`, joined to whatever follows with `connective`.
    pub fn add(&mut self, condition: Condition, connective: Connective) {
        self.tokens.push(Token::Condition(condition));
        self.tokens.push(Token::Connective(connective));
    }

    /// Adds a list of predicates, optionally wrapped in parentheses and
    /// joined to whatever follows with `end`.
    ///
    /// Inside the list each predicate is joined to the one before it by its
    /// own connective; the first predicate's connective is unused.
    /// Malformed predicates are skipped; a group left empty is omitted.
    pub fn add_group(
        &mut self,
        predicates: impl IntoIterator<Item = Predicate>,
        grouped: bool,
        end: Connective,
    ) {
        let built: Vec<(Connective, Condition)> = predicates
            .into_iter()
            .filter_map(|p| {
                Condition::build(&p.column, &p.operator, p.operand).map(|c| (p.connective, c))
            })
            .collect();
        if built.is_empty() {
            return;
        }
        if grouped {
            self.tokens.push(Token::Open);
        }
        for (index, (connective, condition)) in built.into_iter().enumerate() {
            if index > 0 {
                self.tokens.push(Token::Connective(connective));
            }
            self.tokens.push(Token::Condition(condition));
        }
        if grouped {
            self.tokens.push(Token::Close);
        }
        self.tokens.push(Token::Connective(end));
    }

    /// Adds a full-text search over `columns` as a single parenthesized
    /// condition.
    pub fn add_full_text_search(
        &mut self,
        columns: &[&str],
        phrase: &str,
        explode_words: bool,
        mode: FullTextMode,
        connective: Connective,
    ) {
        let columns = columns.iter().map(|column| (*column).to_string()).collect();
        match Condition::full_text(columns, phrase, explode_words, mode) {
            Some(condition) => self.add(condition, connective),
            None => trace!(phrase, "Skipping full-text search without columns or terms"),
        }
    }

    /// Renders the conditions, without the `WHERE` keyword.
    ///
    /// Returns an empty string when there is nothing to render.
    pub fn render(&self, ctx: &mut RenderContext<'_>) -> String {
        let mut pieces: Vec<Piece> = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            match token {
                Token::Condition(condition) => pieces.push(Piece::Text(condition.render(ctx))),
                Token::Connective(connective) => {
                    if matches!(pieces.last(), Some(Piece::Text(_) | Piece::Close)) {
                        pieces.push(Piece::Connective(*connective));
                    }
                }
                Token::Open => pieces.push(Piece::Open),
                Token::Close => {
                    if matches!(pieces.last(), Some(Piece::Connective(_))) {
                        pieces.pop();
                    }
                    if matches!(pieces.last(), Some(Piece::Open)) {
                        pieces.pop();
                    } else {
                        pieces.push(Piece::Close);
                    }
                }
            }
        }
        if matches!(pieces.last(), Some(Piece::Connective(_))) {
            pieces.pop();
        }

        let mut sql = String::new();
        let mut previous: Option<&Piece> = None;
        for piece in &pieces {
            let tight =
                matches!(previous, None | Some(Piece::Open)) || matches!(piece, Piece::Close);
            if !tight {
                sql.push(' ');
            }
            match piece {
                Piece::Text(text) => sql.push_str(text),
                Piece::Connective(connective) => sql.push_str(connective.as_sql()),
                Piece::Open => sql.push('('),
                Piece::Close => sql.push(')'),
            }
            previous = Some(piece);
        }
        sql
    }
}

enum Piece {
    Text(String),
    Connective(Connective),
    Open,
    Close,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect};
    use crate::schema::{ColumnDefinition, ColumnType};

    fn render(
        builder: &ConditionBuilder,
        dialect: &dyn Dialect,
    ) -> (String, crate::params::ParameterSet) {
        let schema =
            TableSchema::new().column("active", ColumnDefinition::new(ColumnType::Boolean));
        let mut binder = ParameterBinder::new();
        let sql = {
            let mut ctx = RenderContext {
                dialect,
                schema: &schema,
                binder: &mut binder,
            };
            builder.render(&mut ctx)
        };
        (sql, binder.take())
    }

    fn cond(column: &str, operator: &str, operand: impl Into<Operand>) -> Condition {
        Condition::build(column, operator, operand.into()).unwrap()
    }

    #[test]
    fn test_trailing_connective_is_dropped() {
        let mut builder = ConditionBuilder::new();
        builder.add(cond("age", ">", 18), Connective::Or);
        builder.add(cond("name", "=", "bob"), Connective::Or);
        let (sql, params) = render(&builder, &MySqlDialect::new());
        assert_eq!(sql, "`age` > :where_0_age OR `name` = :where_1_name");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_group_is_parenthesized_tightly() {
        let mut builder = ConditionBuilder::new();
        builder.add_group(
            vec![
                Predicate::new("age", ">", 18),
                Predicate::new("status", "=", "active"),
            ],
            true,
            Connective::And,
        );
        builder.add(cond("deleted_at", "IS NULL", ()), Connective::And);
        let (sql, _) = render(&builder, &MySqlDialect::new());
        assert_eq!(
            sql,
            "(`age` > :where_0_age AND `status` = :where_1_status) AND `deleted_at` IS NULL"
        );
    }

    #[test]
    fn test_group_entry_connective_joins_previous_entry() {
        let mut builder = ConditionBuilder::new();
        builder.add_group(
            vec![
                Predicate::from(("age", ">", 18)),
                Predicate::from(("status", "=", "active", "or")),
                Predicate::new("name", "=", "bob"),
            ],
            true,
            Connective::Or,
        );
        builder.add(cond("id", ">", 0), Connective::And);
        let (sql, _) = render(&builder, &MySqlDialect::new());
        assert_eq!(
            sql,
            "(`age` > :where_0_age OR `status` = :where_1_status AND `name` = :where_2_name) \
             OR `id` > :where_3_id"
        );
    }

    #[test]
    fn test_ungrouped_list_is_joined_to_what_follows() {
        let mut builder = ConditionBuilder::new();
        builder.add(cond("id", ">", 0), Connective::Or);
        builder.add_group(
            vec![
                Predicate::new("age", ">", 18),
                Predicate::new("status", "=", "active").or(),
            ],
            false,
            Connective::And,
        );
        builder.add(cond("name", "=", "bob"), Connective::And);
        let (sql, _) = render(&builder, &MySqlDialect::new());
        assert_eq!(
            sql,
            "`id` > :where_0_id OR `age` > :where_1_age OR `status` = :where_2_status \
             AND `name` = :where_3_name"
        );
    }

    #[test]
    fn test_empty_group_is_omitted() {
        let mut builder = ConditionBuilder::new();
        builder.add_group(
            vec![
                Predicate::new("id", "IN", Vec::<i64>::new()),
                Predicate::new("id", "SOUNDS LIKE", 1),
            ],
            true,
            Connective::Or,
        );
        assert!(builder.is_empty());
        let (sql, _) = render(&builder, &MySqlDialect::new());
        assert_eq!(sql, "");
    }

    #[test]
    fn test_malformed_conditions_are_skipped() {
        assert!(Condition::build("id", "IN", Operand::List(Vec::new())).is_none());
        assert!(Condition::build("id", "BETWEEN", [1].into()).is_none());
        assert!(Condition::build("id", "BETWEEN", [1, 2, 3].into()).is_none());
        assert!(Condition::build("a,b", "MATCH", "".into()).is_none());
        assert!(Condition::build("", "MATCH", "words".into()).is_none());
        assert!(Condition::build("id", "~~", 1.into()).is_none());
    }

    #[test]
    fn test_set_range_and_null_operators() {
        let mut builder = ConditionBuilder::new();
        builder.add(cond("id", "in", [1, 2, 3]), Connective::And);
        builder.add(cond("age", "BETWEEN", [18, 65]), Connective::And);
        builder.add(cond("email", "not null", ()), Connective::And);
        let (sql, params) = render(&builder, &MySqlDialect::new());
        assert_eq!(
            sql,
            "`id` IN (:in_0_id,:in_1_id,:in_2_id) AND (`age` BETWEEN :bw_3_age AND :bw_4_age) \
             AND `email` IS NOT NULL"
        );
        assert_eq!(params.get("bw_4_age"), Some(&SqlValue::Int(65)));
    }

    #[test]
    fn test_patterns_are_bound() {
        let mut builder = ConditionBuilder::new();
        builder.add(cond("name", "LIKE", "%o'b%"), Connective::And);
        builder.add(cond("code", "REGEXP", "^a"), Connective::And);
        let (sql, params) = render(&builder, &MySqlDialect::new());
        assert_eq!(sql, "`name` LIKE :like_0_name AND `code` REGEXP :like_1_code");
        assert_eq!(params.get("like_0_name"), Some(&SqlValue::Text("%o'b%".into())));

        let (sql, _) = render(&builder, &PostgresDialect::new());
        assert_eq!(sql, "\"name\" LIKE :like_0_name AND \"code\" ~ :like_1_code");
    }

    #[test]
    fn test_raw_and_exists_bypass_binding() {
        let mut builder = ConditionBuilder::new();
        builder.add(cond("score > 10", "CUSTOM", ()), Connective::And);
        builder.add(
            cond("SELECT 1 FROM orders o WHERE o.user_id = users.id", "EXISTS", ()),
            Connective::And,
        );
        let (sql, params) = render(&builder, &MySqlDialect::new());
        assert_eq!(
            sql,
            "score > 10 AND EXISTS (SELECT 1 FROM orders o WHERE o.user_id = users.id)"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_length_and_json_contains() {
        let mut builder = ConditionBuilder::new();
        builder.add(cond("name", "LENGTH>", 3), Connective::And);
        builder.add(cond("tags", "JSON_CONTAINS", vec!["red"]), Connective::And);
        let (sql, params) = render(&builder, &MySqlDialect::new());
        assert_eq!(
            sql,
            "LENGTH(`name`) > :len_0_name AND JSON_CONTAINS(`tags`, :json_1_tags)"
        );
        assert_eq!(params.get("json_1_tags"), Some(&SqlValue::Text("[\"red\"]".into())));
    }

    #[test]
    fn test_boolean_columns_follow_dialect() {
        let mut builder = ConditionBuilder::new();
        builder.add(cond("active", "=", true), Connective::And);
        let (_, params) = render(&builder, &MySqlDialect::new());
        assert_eq!(params.get("where_0_active"), Some(&SqlValue::Int(1)));
        let (_, params) = render(&builder, &PostgresDialect::new());
        assert_eq!(params.get("where_0_active"), Some(&SqlValue::Bool(true)));
    }

    #[test]
    fn test_full_text_regex_mode() {
        let mut builder = ConditionBuilder::new();
        builder.add_full_text_search(
            &["title", "body"],
            "rust  c++",
            true,
            FullTextMode::Regex,
            Connective::And,
        );
        let (sql, params) = render(&builder, &MySqlDialect::new());
        assert_eq!(
            sql,
            "((LOWER(`title`) REGEXP LOWER(:search_0_title)) \
             OR (LOWER(`body`) REGEXP LOWER(:search_1_body)))"
        );
        assert_eq!(
            params.get("search_0_title"),
            Some(&SqlValue::Text("rust|c\\+\\+".into()))
        );
    }

    #[test]
    fn test_full_text_boolean_mode() {
        let mut builder = ConditionBuilder::new();
        builder.add(cond("title, body", "MATCH", "fast car"), Connective::And);
        let (sql, params) = render(&builder, &MySqlDialect::new());
        assert_eq!(
            sql,
            "(MATCH (`title`,`body`) AGAINST (:match_0_title IN BOOLEAN MODE))"
        );
        assert_eq!(params.get("match_0_title"), Some(&SqlValue::Text("+fast* +car*".into())));

        let (_, params) = render(&builder, &PostgresDialect::new());
        assert_eq!(params.get("match_0_title"), Some(&SqlValue::Text("fast:* & car:*".into())));
    }

    #[test]
    fn test_null_safe_equality_per_dialect() {
        let mut builder = ConditionBuilder::new();
        builder.add(cond("parent_id", "<=>", None::<i64>), Connective::And);
        let (sql, _) = render(&builder, &MySqlDialect::new());
        assert_eq!(sql, "`parent_id` <=> :where_0_parent_id");
        let (sql, _) = render(&builder, &PostgresDialect::new());
        assert_eq!(sql, "\"parent_id\" IS NOT DISTINCT FROM :where_0_parent_id");
    }
}
