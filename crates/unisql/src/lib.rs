//! # unisql
//!
//! One handle over MySQL, PostgreSQL and SQLite.
//!
//! - [`open`] / [`Engine::connect`]: parse the URL, create the database when
//!   missing, build the pool and apply pending migrations
//! - [`Queryable`]: `exec`, `query`, `query_row`, `each` and record CRUD on
//!   both [`Engine`] and [`Tx`]
//! - `#[derive(Record)]` / `#[derive(Scan)]`: struct to table mapping
//! - debug mode logs every statement on the `unisql::sql` tracing target
//!
//! Queries are written with `$1, $2, ..` placeholders for every driver.
//!
//! ```no_run
//! use unisql::{Queryable, Record};
//!
//! #[derive(Debug, Default, Record)]
//! #[record(table = "users")]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! # async fn run() -> unisql::SqlResult<()> {
//! let db = unisql::open("sqlite:///data/database.sqlite", "./db/migrations").await?;
//!
//! let user: User = db.query_row_by_id(1).await?;
//! db.exec("UPDATE users SET name = $1 WHERE id = $2", &unisql::args!["Alice", user.id]).await?;
//!
//! let (count,): (i64,) = db.query_row("SELECT count(*) FROM users", &[]).await?.scans()?;
//! # let _ = count;
//! # Ok(())
//! # }
//! ```

extern crate self as unisql;

pub mod backends;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod migrations;
pub mod queryable;
pub mod record;
pub mod row;
pub mod statements;
pub mod tx;
pub mod url;
pub mod value;

pub use backends::executor::ExecResult;
pub use backends::Driver;
pub use config::{DatabaseConfig, PoolConfig};
pub use engine::{open, Engine, Statement};
pub use error::{Error, SqlResult};
pub use logging::{init_logging, LoggingConfig};
pub use migrations::Migrator;
pub use queryable::Queryable;
pub use record::Record;
pub use row::{Row, Rows, Scan};
pub use statements::Prepared;
pub use tx::{IsolationLevel, TransactionConfig, Tx};
pub use crate::url::DatabaseUrl;
pub use value::{FromValue, ToValue, Value};

pub use unisql_derive::{Record, Scan};
