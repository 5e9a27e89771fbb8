//! Query surface shared by [`Engine`](crate::Engine) and [`Tx`](crate::Tx)
//!
//! Implementors provide the four primitives (`exec`, `query`, `query_row`,
//! `each`); the prepared variants and the record helpers are built on top of
//! them once, here.

use async_trait::async_trait;

use crate::backends::executor::ExecResult;
use crate::backends::Driver;
use crate::error::SqlResult;
use crate::record::Record;
use crate::row::{Row, Rows};
use crate::statements::{self, Prepared};
use crate::value::Value;

/// Operations available on a pool handle and inside a transaction
#[async_trait]
pub trait Queryable: Send + Sync {
    /// Driver the queries are sent to
    fn driver(&self) -> Driver;

    /// Whether every call is logged
    fn is_debug(&self) -> bool;

    /// Execute a statement that returns no rows
    async fn exec(&self, query: &str, args: &[Value]) -> SqlResult<ExecResult>;

    /// Run a query and collect every row
    async fn query(&self, query: &str, args: &[Value]) -> SqlResult<Rows>;

    /// Run a query and return its first row, or [`Error::NoRows`](crate::Error::NoRows)
    async fn query_row(&self, query: &str, args: &[Value]) -> SqlResult<Row>;

    /// Stream rows to `callback` one at a time. The first callback error stops
    /// the iteration and is returned.
    async fn each<F>(&self, query: &str, args: &[Value], callback: F) -> SqlResult<()>
    where
        F: FnMut(Row) -> SqlResult<()> + Send;

    async fn exec_prepared(&self, prepared: &Prepared) -> SqlResult<ExecResult> {
        self.exec(&prepared.query, &prepared.args).await
    }

    async fn query_prepared(&self, prepared: &Prepared) -> SqlResult<Rows> {
        self.query(&prepared.query, &prepared.args).await
    }

    async fn query_row_prepared(&self, prepared: &Prepared) -> SqlResult<Row> {
        self.query_row(&prepared.query, &prepared.args).await
    }

    async fn each_prepared<F>(&self, prepared: &Prepared, callback: F) -> SqlResult<()>
    where
        F: FnMut(Row) -> SqlResult<()> + Send,
    {
        self.each(&prepared.query, &prepared.args, callback).await
    }

    /// Insert `row`; `id` is left to the database and the timestamp columns
    /// are set to now
    async fn insert_row<R: Record>(&self, row: &R) -> SqlResult<ExecResult> {
        let prepared = statements::insert_row(row, self.current_unix_timestamp())?;
        self.exec_prepared(&prepared).await
    }

    /// Update every mapped column of `row` except `id` and `created_at`
    async fn update_row<R: Record>(&self, row: &R) -> SqlResult<ExecResult> {
        self.update_row_only(row, &[]).await
    }

    /// Update only the named columns of `row`
    async fn update_row_only<R: Record>(&self, row: &R, only: &[&str]) -> SqlResult<ExecResult> {
        let prepared = statements::update_row(row, only, self.current_unix_timestamp())?;
        self.exec_prepared(&prepared).await
    }

    async fn delete_row_by_id<R: Record>(&self, id: i64) -> SqlResult<ExecResult> {
        self.exec(&statements::delete_row_by_id::<R>(), &[Value::Int(id)]).await
    }

    /// Load the record with the given id
    async fn query_row_by_id<R: Record>(&self, id: i64) -> SqlResult<R> {
        let row = self.query_row(&statements::query_row_by_id::<R>(), &[Value::Int(id)]).await?;
        R::scan(&row)
    }

    /// `Ok(false)` when no row has this id; driver errors are returned
    async fn row_exists<R: Record>(&self, id: i64) -> SqlResult<bool> {
        match self.query_row(&statements::row_exists::<R>(), &[Value::Int(id)]).await {
            Ok(row) => Ok(row.get::<i64>(0)? == 1),
            Err(e) if e.is_no_rows() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Current unix timestamp in seconds (UTC)
    fn current_unix_timestamp(&self) -> i64 {
        statements::current_unix_timestamp()
    }

    fn prepare_sql(&self, query: &str, args: Vec<Value>) -> Prepared {
        statements::prepare_sql(query, args)
    }
}
