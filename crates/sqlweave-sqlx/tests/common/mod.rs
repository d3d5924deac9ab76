#![allow(dead_code)]

use sqlweave_core::{
    ColumnDefinition, ColumnType, Database, Dialect, SchemaRegistry, TableSchema,
};
use sqlweave_sqlx::SqliteDriver;

/// SQLite-compatible DDL for the `users` table registered by [`registry`].
pub const CREATE_USERS: &str = "CREATE TABLE users (\
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    email TEXT, \
    age INTEGER, \
    active BOOLEAN NOT NULL DEFAULT 0, \
    meta TEXT)";

pub fn registry() -> SchemaRegistry {
    let users = TableSchema::new()
        .column(
            "id",
            ColumnDefinition::new(ColumnType::Int).auto_increment().primary(),
        )
        .column("email", ColumnDefinition::new(ColumnType::Varchar).length(255))
        .column("age", ColumnDefinition::new(ColumnType::Int))
        .column(
            "active",
            ColumnDefinition::new(ColumnType::Boolean).default_value("0"),
        )
        .column("meta", ColumnDefinition::new(ColumnType::Json));
    let mut registry = SchemaRegistry::new();
    registry.register("users", users).expect("users schema is valid");
    registry
}

/// In-memory database with the `users` table created.
pub fn database(dialect: Box<dyn Dialect>) -> Database<SqliteDriver> {
    let driver = SqliteDriver::in_memory().expect("in-memory SQLite opens");
    let db = Database::new(driver, dialect, registry());
    db.table("users")
        .raw_query(CREATE_USERS)
        .expect("users table is created");
    db
}
