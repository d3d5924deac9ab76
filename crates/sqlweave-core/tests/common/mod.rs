#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use sqlweave_core::{
    ColumnDefinition, ColumnType, Driver, DriverError, Execution, LiveColumn, LiveIndex,
    LiveTable, ParameterSet, SchemaRegistry, TableSchema,
};

/// Driver that records every statement and replays canned results.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    statements: RefCell<Vec<(String, ParameterSet)>>,
    responses: RefCell<VecDeque<Result<Execution, DriverError>>>,
    tables: RefCell<BTreeMap<String, LiveTable>>,
    fail_on: RefCell<Option<String>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the result of the next executed statement.
    pub fn respond(&self, result: Result<Execution, DriverError>) {
        self.responses.borrow_mut().push_back(result);
    }

    /// Makes every statement containing `fragment` fail.
    pub fn fail_on(&self, fragment: &str) {
        *self.fail_on.borrow_mut() = Some(fragment.to_string());
    }

    /// Declares a live table for introspection.
    pub fn with_table(self, name: &str, table: LiveTable) -> Self {
        self.tables.borrow_mut().insert(name.to_string(), table);
        self
    }

    pub fn set_table(&self, name: &str, table: LiveTable) {
        self.tables.borrow_mut().insert(name.to_string(), table);
    }

    pub fn statements(&self) -> Vec<(String, ParameterSet)> {
        self.statements.borrow().clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements.borrow().iter().map(|(sql, _)| sql.clone()).collect()
    }

    pub fn last(&self) -> (String, ParameterSet) {
        self.statements
            .borrow()
            .last()
            .cloned()
            .expect("no statement was executed")
    }

    pub fn clear(&self) {
        self.statements.borrow_mut().clear();
    }
}

impl Driver for RecordingDriver {
    type Statement = String;

    fn prepare(&self, sql: &str) -> Result<String, DriverError> {
        Ok(sql.to_string())
    }

    fn execute(&self, statement: &String, params: &ParameterSet) -> Result<Execution, DriverError> {
        self.statements
            .borrow_mut()
            .push((statement.clone(), params.clone()));
        if let Some(fragment) = self.fail_on.borrow().as_deref() {
            if statement.contains(fragment) {
                return Err(DriverError::Execution(format!("rejected: {statement}")));
            }
        }
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(Execution::default()))
    }

    fn table_exists(&self, table: &str) -> Result<bool, DriverError> {
        Ok(self.tables.borrow().contains_key(table))
    }

    fn introspect_columns(&self, table: &str) -> Result<Vec<LiveColumn>, DriverError> {
        Ok(self
            .tables
            .borrow()
            .get(table)
            .map(|live| live.columns.clone())
            .unwrap_or_default())
    }

    fn introspect_indexes(&self, table: &str) -> Result<BTreeMap<String, LiveIndex>, DriverError> {
        Ok(self
            .tables
            .borrow()
            .get(table)
            .map(|live| live.indexes.clone())
            .unwrap_or_default())
    }
}

pub fn users_schema() -> TableSchema {
    TableSchema::new()
        .column(
            "id",
            ColumnDefinition::new(ColumnType::Int)
                .unsigned()
                .auto_increment()
                .primary(),
        )
        .column(
            "email",
            ColumnDefinition::new(ColumnType::Varchar).length(255).unique(),
        )
        .column("age", ColumnDefinition::new(ColumnType::Int))
        .column("status", ColumnDefinition::new(ColumnType::Varchar).length(32).index())
        .column(
            "active",
            ColumnDefinition::new(ColumnType::Boolean).default_value("0"),
        )
        .column("meta", ColumnDefinition::new(ColumnType::Json))
        .column(
            "updated_at",
            ColumnDefinition::new(ColumnType::Timestamp)
                .default_value("CURRENT_TIMESTAMP")
                .on_update("CURRENT_TIMESTAMP"),
        )
}

pub fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .register("users", users_schema())
        .expect("users schema is valid");
    registry
}
