mod common;

use common::{registry, users_schema, RecordingDriver};
use sqlweave_core::{Columns, Database, SchemaRegistry, SqlValue, Values};

#[test]
fn test_traces_point_at_the_table_call() {
    let db = Database::mysql(RecordingDriver::new(), registry()).with_tracing();
    let mut users = db.table("users");
    let line = line!() - 1;
    users
        .where_clause("age", "=", 30)
        .where_clause("email", "=", "o'neil@example.com")
        .select(Columns::all())
        .unwrap();

    let traces = db.traces();
    assert_eq!(traces.len(), 1);
    assert_eq!(
        traces[0].query,
        "SELECT * FROM `users` WHERE `age` = 30 AND `email` = 'o''neil@example.com'"
    );
    assert_eq!(traces[0].location, format!("{}:{line}", file!()));
    assert_eq!(db.take_traces().len(), 1);
    assert!(db.traces().is_empty());
}

#[test]
fn test_tracing_is_off_by_default() {
    let db = Database::mysql(RecordingDriver::new(), registry());
    db.table("users").delete().unwrap();
    assert!(db.traces().is_empty());
}

#[test]
fn test_reload_registry_changes_coercion() {
    let mut db = Database::mysql(RecordingDriver::new(), SchemaRegistry::new());
    db.table("users")
        .insert(&Values::new().set("active", true))
        .unwrap();
    assert_eq!(
        db.driver().last().1.get("ins_0_active"),
        Some(&SqlValue::Bool(true))
    );

    let mut registry = SchemaRegistry::new();
    registry.register("users", users_schema()).unwrap();
    db.reload_registry(registry);
    db.table("users")
        .insert(&Values::new().set("active", true))
        .unwrap();
    assert_eq!(
        db.driver().last().1.get("ins_0_active"),
        Some(&SqlValue::Int(1))
    );
    assert_eq!(db.registry().len(), 1);
}
