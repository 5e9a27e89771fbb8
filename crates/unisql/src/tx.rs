//! Transactions
//!
//! A [`Tx`] exposes the same [`Queryable`] surface as the engine. Calls are
//! serialized on the single underlying connection.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::any::Any;
use sqlx::Transaction;
use tokio::sync::Mutex;
use tracing::warn;

use crate::backends::executor::{self, ExecResult};
use crate::backends::Driver;
use crate::error::{Error, SqlResult};
use crate::logging::log_call;
use crate::queryable::Queryable;
use crate::row::{Row, Rows};
use crate::value::Value;

/// Transaction isolation levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// Convert to SQL string for SET TRANSACTION ISOLATION LEVEL command
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Options for [`Engine::begin_with`](crate::Engine::begin_with)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionConfig {
    /// `None` keeps the server default
    pub isolation_level: Option<IsolationLevel>,
    pub read_only: bool,
}

impl TransactionConfig {
    pub fn with_isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = Some(level);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    fn characteristics(&self) -> Vec<String> {
        let mut parts = Vec::new();
        if let Some(level) = self.isolation_level {
            parts.push(format!("ISOLATION LEVEL {}", level.as_sql()));
        }
        if self.read_only {
            parts.push("READ ONLY".to_string());
        }
        parts
    }

    /// Statement run on the connection before `BEGIN`
    ///
    /// MySQL applies `SET TRANSACTION` to the next transaction and rejects it
    /// inside an open one.
    pub fn before_begin(&self, driver: Driver) -> Option<String> {
        let parts = self.characteristics();
        match driver {
            Driver::MySql if !parts.is_empty() => Some(format!("SET TRANSACTION {}", parts.join(", "))),
            _ => None,
        }
    }

    /// Statements run right after `BEGIN`
    pub fn after_begin(&self, driver: Driver) -> Vec<String> {
        match driver {
            Driver::Postgres => self
                .characteristics()
                .into_iter()
                .map(|part| format!("SET TRANSACTION {}", part))
                .collect(),
            Driver::MySql | Driver::Sqlite => Vec::new(),
        }
    }
}

/// An open transaction, finished by [`Tx::commit`] or [`Tx::rollback`]
///
/// Dropping an unfinished `Tx` rolls it back.
pub struct Tx {
    /// Only taken by `commit`/`rollback`, which consume the `Tx`, so every
    /// other method sees `Some`. The `Option` lets `Drop` tell a finished
    /// transaction from an abandoned one.
    inner: Mutex<Option<Transaction<'static, Any>>>,
    driver: Driver,
    debug: bool,
    start: Instant,
}

impl Tx {
    pub(crate) fn new(tx: Transaction<'static, Any>, driver: Driver, debug: bool) -> Self {
        Self {
            inner: Mutex::new(Some(tx)),
            driver,
            debug,
            start: Instant::now(),
        }
    }

    /// Commit the transaction
    pub async fn commit(mut self) -> SqlResult<()> {
        let result = match self.inner.get_mut().take() {
            Some(tx) => tx.commit().await.map_err(Error::from),
            None => Err(Error::TransactionClosed),
        };
        log_call(self.debug, true, "Commit", "", &[], self.start, &result);
        result
    }

    /// Roll the transaction back
    pub async fn rollback(mut self) -> SqlResult<()> {
        let result = match self.inner.get_mut().take() {
            Some(tx) => tx.rollback().await.map_err(Error::from),
            None => Err(Error::TransactionClosed),
        };
        log_call(self.debug, true, "Rollback", "", &[], self.start, &result);
        result
    }
}

impl std::fmt::Debug for Tx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tx")
            .field("driver", &self.driver)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Drop for Tx {
    fn drop(&mut self) {
        if self.inner.get_mut().is_some() {
            warn!("Transaction dropped without explicit commit or rollback - this will cause an automatic rollback");
        }
    }
}

#[async_trait]
impl Queryable for Tx {
    fn driver(&self) -> Driver {
        self.driver
    }

    fn is_debug(&self) -> bool {
        self.debug
    }

    async fn exec(&self, query: &str, args: &[Value]) -> SqlResult<ExecResult> {
        let start = Instant::now();
        let sql = self.driver.fix_query(query);
        let mut guard = self.inner.lock().await;
        let result = match guard.as_mut() {
            Some(tx) => executor::execute_on(&mut **tx, self.driver, &sql, args).await,
            None => Err(Error::TransactionClosed),
        };
        log_call(self.debug, true, "Exec", &sql, args, start, &result);
        result
    }

    async fn query(&self, query: &str, args: &[Value]) -> SqlResult<Rows> {
        let start = Instant::now();
        let sql = self.driver.fix_query(query);
        let mut guard = self.inner.lock().await;
        let result = match guard.as_mut() {
            Some(tx) => executor::fetch_all(&mut **tx, &sql, args).await,
            None => Err(Error::TransactionClosed),
        };
        log_call(self.debug, true, "Query", &sql, args, start, &result);
        result
    }

    async fn query_row(&self, query: &str, args: &[Value]) -> SqlResult<Row> {
        let start = Instant::now();
        let sql = self.driver.fix_query(query);
        let mut guard = self.inner.lock().await;
        let result = match guard.as_mut() {
            Some(tx) => executor::fetch_optional(&mut **tx, &sql, args)
                .await
                .and_then(|row| row.ok_or(Error::NoRows)),
            None => Err(Error::TransactionClosed),
        };
        log_call(self.debug, true, "QueryRow", &sql, args, start, &result);
        result
    }

    async fn each<F>(&self, query: &str, args: &[Value], callback: F) -> SqlResult<()>
    where
        F: FnMut(Row) -> SqlResult<()> + Send,
    {
        let start = Instant::now();
        let sql = self.driver.fix_query(query);
        let mut guard = self.inner.lock().await;
        let result = match guard.as_mut() {
            Some(tx) => executor::for_each(&mut **tx, &sql, args, callback).await,
            None => Err(Error::TransactionClosed),
        };
        log_call(self.debug, true, "Each", &sql, args, start, &result);
        result
    }
}
