//! Table schema registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::{MapAccess, Visitor};
use serde::Deserializer;
use tracing::warn;

use super::TableSchema;
use crate::error::SchemaError;

/// Registered table schemas, keyed by their prefixed table name.
///
/// Every method taking a table name expects the logical (unprefixed) name;
/// iteration yields the prefixed names.
///
/// Lookups never fail: an unregistered table yields an empty schema and a
/// warning, which keeps ad-hoc tables usable. Use
/// [`SchemaRegistry::try_table`] for strict lookups.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    prefix: String,
    tables: BTreeMap<String, Arc<TableSchema>>,
    // Registration order, used for reconciliation order.
    order: Vec<String>,
    empty: Arc<TableSchema>,
}

impl SchemaRegistry {
    /// Creates an empty registry without a table prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry whose table names are prefixed with
    /// `prefix`.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Returns the table prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the logical table `name` with the registry prefix prepended.
    #[must_use]
    pub fn qualify(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    /// Registers `schema` under `name`, replacing an earlier registration.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::AutoIncrementRequiresInteger`] when an
    /// `auto_increment` column does not have an integer type.
    pub fn register(&mut self, name: &str, schema: TableSchema) -> Result<(), SchemaError> {
        let table = self.qualify(name);
        for (column, def) in schema.iter() {
            if def.auto_increment && !def.column_type.is_integer() {
                return Err(SchemaError::AutoIncrementRequiresInteger {
                    table,
                    column: column.to_string(),
                    column_type: def.column_type.to_string(),
                });
            }
        }
        if !self.tables.contains_key(&table) {
            self.order.push(table.clone());
        }
        self.tables.insert(table, Arc::new(schema));
        Ok(())
    }

    /// Returns the schema of `name`, or an empty schema with a warning when
    /// the table is not registered.
    #[must_use]
    pub fn table(&self, name: &str) -> Arc<TableSchema> {
        let table = self.qualify(name);
        self.tables.get(&table).cloned().unwrap_or_else(|| {
            warn!(table = %table, "Table is not registered, using an empty schema");
            Arc::clone(&self.empty)
        })
    }

    /// Returns the schema of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NotRegistered`] when the table is unknown.
    pub fn try_table(&self, name: &str) -> Result<Arc<TableSchema>, SchemaError> {
        let table = self.qualify(name);
        self.tables
            .get(&table)
            .cloned()
            .ok_or(SchemaError::NotRegistered(table))
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&self.qualify(name))
    }

    /// Registered table names (prefixed) in registration order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Iterates over registered tables in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<TableSchema>)> {
        self.order
            .iter()
            .filter_map(|name| self.tables.get(name).map(|schema| (name.as_str(), schema)))
    }

    /// Number of registered tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Replaces every registration with the contents of `other`, keeping
    /// this registry's prefix.
    ///
    /// # Errors
    ///
    /// Propagates registration errors; on error `self` is left unchanged.
    pub fn replace(&mut self, other: Self) -> Result<(), SchemaError> {
        let mut fresh = Self::with_prefix(self.prefix.clone());
        for (name, schema) in other.iter() {
            let logical = name.strip_prefix(other.prefix.as_str()).unwrap_or(name);
            fresh.register(logical, schema.as_ref().clone())?;
        }
        *self = fresh;
        Ok(())
    }

    /// Parses a schema document (`{table: {column: definition}}`) and
    /// registers every table in document order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] for malformed documents and
    /// registration errors for invalid definitions.
    pub fn from_json_str(prefix: &str, document: &str) -> Result<Self, SchemaError> {
        let tables = parse_document(document)?;
        let mut registry = Self::with_prefix(prefix);
        for (name, schema) in tables {
            registry.register(&name, schema)?;
        }
        Ok(registry)
    }

    /// Re-reads a schema document into this registry, replacing all
    /// registrations.
    ///
    /// # Errors
    ///
    /// See [`SchemaRegistry::from_json_str`]. On error `self` is unchanged.
    pub fn reload_json_str(&mut self, document: &str) -> Result<(), SchemaError> {
        let fresh = Self::from_json_str(&self.prefix, document)?;
        *self = fresh;
        Ok(())
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Vec<(String, TableSchema)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of table name to table schema")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut tables = Vec::new();
        while let Some(entry) = access.next_entry::<String, TableSchema>()? {
            tables.push(entry);
        }
        Ok(tables)
    }
}

fn parse_document(document: &str) -> Result<Vec<(String, TableSchema)>, serde_json::Error> {
    let mut deserializer = serde_json::Deserializer::from_str(document);
    let tables = (&mut deserializer).deserialize_map(DocumentVisitor)?;
    deserializer.end()?;
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDefinition, ColumnType};

    fn users() -> TableSchema {
        TableSchema::new()
            .column(
                "id",
                ColumnDefinition::new(ColumnType::Int).auto_increment().primary(),
            )
            .column("active", ColumnDefinition::new(ColumnType::Boolean))
    }

    #[test]
    fn test_register_and_lookup_with_prefix() {
        let mut registry = SchemaRegistry::with_prefix("app_");
        registry.register("users", users()).unwrap();
        assert!(registry.contains("users"));
        assert!(!registry.contains("app_users"));
        assert_eq!(registry.table("users").len(), 2);
        assert_eq!(registry.table_names().collect::<Vec<_>>(), vec!["app_users"]);
    }

    #[test]
    fn test_prefix_is_prepended_even_when_already_present() {
        let mut registry = SchemaRegistry::with_prefix("app_");
        assert_eq!(registry.qualify("app_users"), "app_app_users");
        registry.register("app_users", users()).unwrap();
        registry.register("users", users()).unwrap();
        assert_eq!(
            registry.table_names().collect::<Vec<_>>(),
            vec!["app_app_users", "app_users"]
        );
        assert!(registry.try_table("app_users").is_ok());
        assert_eq!(SchemaRegistry::new().qualify("users"), "users");
    }

    #[test]
    fn test_unregistered_table_yields_empty_schema() {
        let registry = SchemaRegistry::new();
        assert!(registry.table("ghost").is_empty());
        assert!(matches!(
            registry.try_table("ghost"),
            Err(SchemaError::NotRegistered(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_auto_increment_requires_integer() {
        let mut registry = SchemaRegistry::new();
        let schema = TableSchema::new().column(
            "id",
            ColumnDefinition::new(ColumnType::Varchar).auto_increment(),
        );
        let err = registry.register("broken", schema).unwrap_err();
        assert!(matches!(err, SchemaError::AutoIncrementRequiresInteger { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_from_json_keeps_table_order() {
        let registry = SchemaRegistry::from_json_str(
            "",
            r#"{
                "posts": {"id": {"type": "int", "primary": true}},
                "authors": {"id": {"type": "int", "primary": true}}
            }"#,
        )
        .unwrap();
        assert_eq!(
            registry.table_names().collect::<Vec<_>>(),
            vec!["posts", "authors"]
        );
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = SchemaRegistry::from_json_str("", "{\"t\": 3}").unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
    }

    #[test]
    fn test_reload_replaces_registrations() {
        let mut registry = SchemaRegistry::new();
        registry.register("users", users()).unwrap();
        registry
            .reload_json_str(r#"{"orders": {"id": {"type": "bigint"}}}"#)
            .unwrap();
        assert!(!registry.contains("users"));
        assert!(registry.contains("orders"));
    }

    #[test]
    fn test_replace_keeps_prefix() {
        let mut registry = SchemaRegistry::with_prefix("t_");
        let mut other = SchemaRegistry::with_prefix("o_");
        other.register("users", users()).unwrap();
        registry.replace(other).unwrap();
        assert!(registry.contains("users"));
        assert_eq!(registry.table_names().collect::<Vec<_>>(), vec!["t_users"]);
    }
}
