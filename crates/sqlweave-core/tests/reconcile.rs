//! Schema reconciliation against introspected live tables.

mod common;

use std::collections::BTreeMap;

use common::{registry, RecordingDriver};
use sqlweave_core::{
    ColumnDefinition, ColumnType, Database, IndexOrigin, LiveColumn, LiveIndex, LiveTable,
    PostgresDialect, ReconcileError, ReconcileOptions, SchemaRegistry, TableSchema,
};

fn live_users_mysql() -> LiveTable {
    LiveTable {
        columns: vec![
            LiveColumn::new("id", "int(10) unsigned"),
            LiveColumn::new("email", "varchar(255)"),
            LiveColumn::new("age", "int(11)"),
            LiveColumn::new("status", "varchar(32)"),
            LiveColumn::new("active", "tinyint(1)"),
            LiveColumn::new("meta", "json"),
            LiveColumn::new("updated_at", "timestamp"),
        ],
        indexes: BTreeMap::from([
            (
                "PRIMARY".to_string(),
                LiveIndex::new(["id"]).origin(IndexOrigin::PrimaryKey),
            ),
            ("uniq_email".to_string(), LiveIndex::new(["email"]).unique()),
            ("idx_status".to_string(), LiveIndex::new(["status"])),
        ]),
    }
}

fn drifted_users_mysql() -> LiveTable {
    let mut live = live_users_mysql();
    live.columns.retain(|column| column.name != "meta");
    live.columns.push(LiveColumn::new("legacy", "text"));
    live.indexes
        .insert("legacy_lookup".to_string(), LiveIndex::new(["legacy"]));
    live
}

#[test]
fn test_absent_table_is_created() {
    let db = Database::mysql(RecordingDriver::new(), registry());
    let plan = db.plan(&ReconcileOptions::safe()).unwrap();
    assert_eq!(
        plan,
        vec![
            "CREATE TABLE `users` (`id` INT UNSIGNED AUTO_INCREMENT PRIMARY KEY, \
             `email` VARCHAR(255), `age` INT, `status` VARCHAR(32), \
             `active` TINYINT(1) DEFAULT '0', `meta` JSON, \
             `updated_at` TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP, \
             UNIQUE `uniq_email` (`email`), INDEX `idx_status` (`status`))"
                .to_string()
        ]
    );
    assert!(db.driver().statements().is_empty());
}

#[test]
fn test_matching_table_needs_nothing() {
    let driver = RecordingDriver::new().with_table("users", live_users_mysql());
    let db = Database::mysql(driver, registry());
    assert!(db.plan(&ReconcileOptions::safe()).unwrap().is_empty());
    assert!(db.plan(&ReconcileOptions::full()).unwrap().is_empty());
    assert!(db.reconcile(&ReconcileOptions::full()).unwrap().is_empty());
    assert!(db.driver().statements().is_empty());
}

#[test]
fn test_safe_mode_never_drops() {
    let driver = RecordingDriver::new().with_table("users", drifted_users_mysql());
    let db = Database::mysql(driver, registry());
    let plan = db.plan(&ReconcileOptions::safe()).unwrap();
    assert_eq!(
        plan,
        vec!["ALTER TABLE `users` ADD COLUMN `meta` JSON".to_string()]
    );
    assert!(plan.iter().all(|sql| !sql.contains("DROP")));
}

#[test]
fn test_full_mode_batches_one_alter() {
    let driver = RecordingDriver::new().with_table("users", drifted_users_mysql());
    let db = Database::mysql(driver, registry());
    let plan = db.plan(&ReconcileOptions::full()).unwrap();
    assert_eq!(
        plan,
        vec![
            "ALTER TABLE `users` DROP INDEX `legacy_lookup`, ADD COLUMN `meta` JSON, \
             DROP COLUMN `legacy`"
                .to_string()
        ]
    );
}

#[test]
fn test_preserved_index_is_kept() {
    let driver = RecordingDriver::new().with_table("users", drifted_users_mysql());
    let db = Database::mysql(driver, registry());
    let plan = db
        .plan(&ReconcileOptions::full().preserve_index("legacy_lookup"))
        .unwrap();
    assert_eq!(plan.len(), 1);
    assert!(!plan[0].contains("DROP INDEX"));
    assert!(plan[0].contains("DROP COLUMN `legacy`"));
}

#[test]
fn test_primary_key_is_never_modified() {
    let mut live = live_users_mysql();
    live.columns[0] = LiveColumn::new("id", "bigint(20)");
    live.columns[2] = LiveColumn::new("age", "bigint(20)");
    let driver = RecordingDriver::new().with_table("users", live);
    let db = Database::mysql(driver, registry());
    let plan = db.plan(&ReconcileOptions::full()).unwrap();
    assert_eq!(
        plan,
        vec!["ALTER TABLE `users` MODIFY COLUMN `age` INT".to_string()]
    );
}

#[test]
fn test_reconcile_executes_the_plan_and_converges() {
    let driver = RecordingDriver::new().with_table("users", drifted_users_mysql());
    let db = Database::mysql(driver, registry());
    let applied = db.reconcile(&ReconcileOptions::full()).unwrap();
    assert_eq!(db.driver().sql(), applied);

    // the applied DDL brings the live table back to the declared shape
    db.driver().set_table("users", live_users_mysql());
    assert!(db.plan(&ReconcileOptions::full()).unwrap().is_empty());
}

#[test]
fn test_failed_ddl_names_the_table() {
    let driver = RecordingDriver::new().with_table("users", drifted_users_mysql());
    driver.fail_on("ALTER TABLE");
    let db = Database::mysql(driver, registry());
    let err = db.reconcile(&ReconcileOptions::safe()).unwrap_err();
    let ReconcileError::Driver { table, .. } = err;
    assert_eq!(table, "users");
}

#[test]
fn test_postgres_create_uses_standalone_index_statements() {
    let db = Database::new(
        RecordingDriver::new(),
        Box::new(PostgresDialect::new()),
        registry(),
    );
    let plan = db.plan(&ReconcileOptions::safe()).unwrap();
    assert_eq!(plan.len(), 2);
    assert!(plan[0].starts_with("CREATE TABLE \"users\" (\"id\" SERIAL PRIMARY KEY,"));
    assert!(plan[0].ends_with("CONSTRAINT \"users_uniq_email\" UNIQUE (\"email\"))"));
    assert!(!plan[0].contains("ON UPDATE"));
    assert_eq!(
        plan[1],
        "CREATE INDEX \"users_idx_status\" ON \"users\" (\"status\")"
    );
}

#[test]
fn test_postgres_adds_missing_indexes() {
    let live = LiveTable {
        columns: vec![
            LiveColumn::new("id", "integer"),
            LiveColumn::new("email", "character varying(255)"),
            LiveColumn::new("age", "integer"),
            LiveColumn::new("status", "character varying(32)"),
            LiveColumn::new("active", "boolean"),
            LiveColumn::new("meta", "json"),
            LiveColumn::new("updated_at", "timestamp without time zone"),
        ],
        indexes: BTreeMap::from([(
            "users_pkey".to_string(),
            LiveIndex::new(["id"]).origin(IndexOrigin::PrimaryKey),
        )]),
    };
    let driver = RecordingDriver::new().with_table("users", live);
    let db = Database::new(driver, Box::new(PostgresDialect::new()), registry());
    let plan = db.plan(&ReconcileOptions::full()).unwrap();
    assert_eq!(
        plan,
        vec![
            "ALTER TABLE \"users\" ADD CONSTRAINT \"users_uniq_email\" UNIQUE (\"email\")"
                .to_string(),
            "CREATE INDEX \"users_idx_status\" ON \"users\" (\"status\")".to_string(),
        ]
    );
}

#[test]
fn test_mysql_decimal_columns_settle() {
    let mut registry = SchemaRegistry::new();
    let prices = TableSchema::new()
        .column("price", ColumnDefinition::new(ColumnType::Decimal).length(10))
        .column("total", ColumnDefinition::new(ColumnType::Decimal));
    registry.register("prices", prices).unwrap();
    let live = LiveTable {
        columns: vec![
            LiveColumn::new("price", "decimal(10,0)"),
            LiveColumn::new("total", "decimal(10,0)"),
        ],
        indexes: BTreeMap::new(),
    };
    let driver = RecordingDriver::new().with_table("prices", live);
    let db = Database::mysql(driver, registry);
    assert!(db.plan(&ReconcileOptions::full()).unwrap().is_empty());

    let shrunk = LiveTable {
        columns: vec![
            LiveColumn::new("price", "decimal(8,0)"),
            LiveColumn::new("total", "decimal(10,0)"),
        ],
        indexes: BTreeMap::new(),
    };
    db.driver().set_table("prices", shrunk);
    assert_eq!(
        db.plan(&ReconcileOptions::safe()).unwrap(),
        vec!["ALTER TABLE `prices` MODIFY COLUMN `price` DECIMAL(10)".to_string()]
    );
}
