//! Pieces shared by every sqlx driver.

use std::future::Future;

use sqlweave_core::DriverError;
use tokio::runtime::{Builder, Runtime};

/// Blocking bridge between the synchronous driver API and sqlx.
#[derive(Debug)]
pub struct BlockingRuntime {
    runtime: Runtime,
}

impl BlockingRuntime {
    pub fn new() -> Result<Self, DriverError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| DriverError::Connection(format!("cannot start runtime: {err}")))?;
        Ok(Self { runtime })
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Maps a sqlx error to the driver error the core understands.
pub fn driver_error(err: sqlx::Error) -> DriverError {
    match err {
        sqlx::Error::Configuration(_)
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => DriverError::Connection(err.to_string()),
        other => DriverError::Execution(other.to_string()),
    }
}

/// Returns `true` if `sql` produces a result set.
pub fn returns_rows(sql: &str) -> bool {
    let head = sql
        .trim_start()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(
        head.as_str(),
        "SELECT" | "WITH" | "PRAGMA" | "EXPLAIN" | "VALUES" | "SHOW" | "DESCRIBE"
    ) || sql.to_ascii_uppercase().contains(" RETURNING ")
}

/// Returns `true` if `sql` is an `INSERT`.
pub fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("INSERT"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_rows() {
        assert!(returns_rows("SELECT 1"));
        assert!(returns_rows("  with t as (select 1) select * from t"));
        assert!(returns_rows(
            "INSERT INTO \"users\" (\"a\") VALUES (?) RETURNING \"id\""
        ));
        assert!(!returns_rows("INSERT INTO users (a) VALUES (?)"));
        assert!(!returns_rows("UPDATE users SET a = ?"));
    }

    #[test]
    fn test_is_insert() {
        assert!(is_insert("insert into t values (1)"));
        assert!(!is_insert("UPDATE t SET a = 1"));
        assert!(!is_insert("INS"));
    }

    #[test]
    fn test_pool_errors_are_connection_errors() {
        assert!(matches!(
            driver_error(sqlx::Error::PoolTimedOut),
            DriverError::Connection(_)
        ));
        assert!(matches!(
            driver_error(sqlx::Error::RowNotFound),
            DriverError::Execution(_)
        ));
    }
}
