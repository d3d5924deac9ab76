//! Declarative table schemas.
//!
//! A [`TableSchema`] is an ordered mapping of column name to
//! [`ColumnDefinition`]. Schemas are registered once in a
//! [`SchemaRegistry`] and shared with query builders behind an `Arc`.

mod column;
mod registry;

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use column::{is_current_timestamp, ColumnDefinition, ColumnType, CURRENT_TIMESTAMP};
pub use registry::SchemaRegistry;

/// Ordered column definitions of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<(String, ColumnDefinition)>,
}

impl TableSchema {
    /// Creates an empty schema.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Adds a column, replacing an earlier definition with the same name.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, definition: ColumnDefinition) -> Self {
        self.insert(name, definition);
        self
    }

    /// In-place variant of [`TableSchema::column`].
    pub fn insert(&mut self, name: impl Into<String>, definition: ColumnDefinition) {
        let name = name.into();
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = definition,
            None => self.columns.push((name, definition)),
        }
    }

    /// Returns the definition of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, def)| def)
    }

    /// Returns `true` if the schema declares `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over columns in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnDefinition)> {
        self.columns.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the name of the primary key column, if any.
    #[must_use]
    pub fn primary_key(&self) -> Option<&str> {
        self.iter()
            .find(|(_, def)| def.primary)
            .map(|(name, _)| name)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if no columns are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ColumnDefinition)> for TableSchema {
    fn from_iter<I: IntoIterator<Item = (K, ColumnDefinition)>>(iter: I) -> Self {
        let mut schema = Self::new();
        for (name, def) in iter {
            schema.insert(name, def);
        }
        schema
    }
}

impl Serialize for TableSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, def) in &self.columns {
            map.serialize_entry(name, def)?;
        }
        map.end()
    }
}

struct TableSchemaVisitor;

impl<'de> Visitor<'de> for TableSchemaVisitor {
    type Value = TableSchema;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of column name to column definition")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut schema = TableSchema::new();
        while let Some((name, def)) = access.next_entry::<String, ColumnDefinition>()? {
            schema.insert(name, def);
        }
        Ok(schema)
    }
}

// Document order is significant, so the map is read entry by entry instead
// of through a hash map.
impl<'de> Deserialize<'de> for TableSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TableSchemaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_keeps_document_order() {
        let schema: TableSchema = serde_json::from_str(
            r#"{"zeta": {"type": "int"}, "alpha": {"type": "text"}, "mid": {"type": "json"}}"#,
        )
        .unwrap();
        let names: Vec<&str> = schema.column_names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_primary_key_lookup() {
        let schema = TableSchema::new()
            .column("name", ColumnDefinition::new(ColumnType::Varchar).length(64))
            .column(
                "id",
                ColumnDefinition::new(ColumnType::Int).auto_increment().primary(),
            );
        assert_eq!(schema.primary_key(), Some("id"));
        assert!(TableSchema::new().primary_key().is_none());
    }

    #[test]
    fn test_serialize_roundtrip_preserves_order() {
        let schema = TableSchema::new()
            .column("b", ColumnDefinition::new(ColumnType::Boolean))
            .column("a", ColumnDefinition::new(ColumnType::Int));
        let text = serde_json::to_string(&schema).unwrap();
        assert!(text.find("\"b\"").unwrap() < text.find("\"a\"").unwrap());
        let back: TableSchema = serde_json::from_str(&text).unwrap();
        assert_eq!(back, schema);
    }
}
