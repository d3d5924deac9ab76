//! # sqlweave-sqlx
//!
//! [`Driver`](sqlweave_core::Driver) implementations over sqlx.
//!
//! - [`SqliteDriver`] (feature `sqlite`, on by default)
//! - [`MySqlDriver`] (feature `mysql`)
//!
//! The core is synchronous, so every driver owns a current-thread tokio
//! runtime and blocks on each call. Drivers must therefore not be used from
//! inside another tokio runtime.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlweave_core::{Database, SchemaRegistry, Values};
//! use sqlweave_sqlx::SqliteDriver;
//!
//! let driver = SqliteDriver::in_memory()?;
//! let db = Database::mysql(driver, SchemaRegistry::new());
//! db.table("users").insert(&Values::new().set("name", "alice"))?;
//! ```

mod runtime;

#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "mysql")]
pub use mysql::MySqlDriver;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDriver;
