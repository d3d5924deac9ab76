//! Column definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical column type.
///
/// Parsed case-insensitively; names without a dedicated variant are kept as
/// [`ColumnType::Custom`] and passed through to DDL verbatim (uppercased).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    /// Fixed-length character string.
    Char,
    /// Variable-length character string.
    Varchar,
    /// Unbounded text.
    Text,
    /// 8-bit integer.
    Tinyint,
    /// 16-bit integer.
    Smallint,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Bigint,
    /// Boolean, stored as `TINYINT(1)` where there is no native type.
    Boolean,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Fixed-point decimal.
    Decimal,
    /// Date only.
    Date,
    /// Date and time.
    Datetime,
    /// Timestamp.
    Timestamp,
    /// JSON document.
    Json,
    /// Any other type name.
    Custom(String),
}

impl ColumnType {
    /// Returns the lowercase type name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Char => "char",
            Self::Varchar => "varchar",
            Self::Text => "text",
            Self::Tinyint => "tinyint",
            Self::Smallint => "smallint",
            Self::Int => "int",
            Self::Bigint => "bigint",
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Json => "json",
            Self::Custom(name) => name,
        }
    }

    /// Returns `true` for the integer family.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Tinyint | Self::Smallint | Self::Int | Self::Bigint
        )
    }
}

impl From<&str> for ColumnType {
    fn from(name: &str) -> Self {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "char" => Self::Char,
            "varchar" => Self::Varchar,
            "text" => Self::Text,
            "tinyint" => Self::Tinyint,
            "smallint" => Self::Smallint,
            "int" | "integer" => Self::Int,
            "bigint" => Self::Bigint,
            "boolean" | "bool" => Self::Boolean,
            "float" => Self::Float,
            "double" => Self::Double,
            "decimal" => Self::Decimal,
            "date" => Self::Date,
            "datetime" => Self::Datetime,
            "timestamp" => Self::Timestamp,
            "json" => Self::Json,
            _ => Self::Custom(lower),
        }
    }
}

impl From<String> for ColumnType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<ColumnType> for String {
    fn from(column_type: ColumnType) -> Self {
        column_type.name().to_string()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The sentinel accepted by `default` and `on_update` that is emitted
/// unquoted.
pub const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

/// Declarative definition of one column.
///
/// Deserializes from the schema document format, where every key except
/// `type` is optional:
///
/// ```rust
/// use sqlweave_core::schema::{ColumnDefinition, ColumnType};
///
/// let def: ColumnDefinition =
///     serde_json::from_str(r#"{"type": "int", "auto_increment": true, "primary": true}"#)
///         .unwrap();
/// assert_eq!(def.column_type, ColumnType::Int);
/// assert_eq!(def.length, 0);
/// assert!(def.primary);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Logical type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Length / display width; `0` means none.
    #[serde(default)]
    pub length: u32,
    /// `UNSIGNED` modifier.
    #[serde(default)]
    pub unsigned: bool,
    /// Auto-increment column.
    #[serde(default)]
    pub auto_increment: bool,
    /// Primary key column.
    #[serde(default)]
    pub primary: bool,
    /// Single-column unique index (`uniq_<column>`).
    #[serde(default)]
    pub unique: bool,
    /// Single-column index (`idx_<column>`).
    #[serde(default)]
    pub index: bool,
    /// Default value; empty means none.
    #[serde(default)]
    pub default: String,
    /// `ON UPDATE` expression; empty means none.
    #[serde(default)]
    pub on_update: String,
}

impl ColumnDefinition {
    /// Creates a definition with every optional attribute at its default.
    #[must_use]
    pub fn new(column_type: impl Into<ColumnType>) -> Self {
        Self {
            column_type: column_type.into(),
            length: 0,
            unsigned: false,
            auto_increment: false,
            primary: false,
            unique: false,
            index: false,
            default: String::new(),
            on_update: String::new(),
        }
    }

    /// Sets the length.
    #[must_use]
    pub const fn length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    /// Marks the column `UNSIGNED`.
    #[must_use]
    pub const fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Marks the column auto-increment.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Marks the column as the primary key.
    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Requests a unique index.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Requests a plain index.
    #[must_use]
    pub const fn index(mut self) -> Self {
        self.index = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    /// Sets the `ON UPDATE` expression.
    #[must_use]
    pub fn on_update(mut self, expression: impl Into<String>) -> Self {
        self.on_update = expression.into();
        self
    }

    /// Returns `true` if the reconciler must never rewrite this column.
    #[must_use]
    pub const fn is_key_column(&self) -> bool {
        self.auto_increment || self.primary
    }
}

/// Returns `true` if `expression` is the `CURRENT_TIMESTAMP` sentinel.
#[must_use]
pub fn is_current_timestamp(expression: &str) -> bool {
    expression.trim().eq_ignore_ascii_case(CURRENT_TIMESTAMP)
}
