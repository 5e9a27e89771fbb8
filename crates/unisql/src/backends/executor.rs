//! Query execution on top of the sqlx `Any` driver
//!
//! Shared by the engine, transactions and prepared statements: binding
//! [`Value`]s, running a query against any executor and converting driver rows
//! into owned [`Row`]s.

use futures::TryStreamExt;
use sqlx::any::{Any, AnyArguments, AnyQueryResult, AnyRow};
use sqlx::AnyConnection;
use sqlx::query::Query;
use sqlx::{Column, Executor, Row as _, TypeInfo, ValueRef};

use super::Driver;
use crate::error::{Error, SqlResult};
use crate::row::{Row, Rows};
use crate::value::Value;

pub(crate) type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

/// Outcome of a statement that returns no rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    rows_affected: u64,
    last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64, last_insert_id: Option<i64>) -> Self {
        Self {
            rows_affected,
            last_insert_id,
        }
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Id generated by the last insert; `None` where the driver does not
    /// report one (PostgreSQL). SQLite reports `last_insert_rowid()` of the
    /// connection, which keeps the previous value after non-insert statements.
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }
}

impl From<AnyQueryResult> for ExecResult {
    fn from(result: AnyQueryResult) -> Self {
        Self::new(result.rows_affected(), result.last_insert_id())
    }
}

/// Bind one value to a query
pub(crate) fn bind_value<'q>(query: AnyQuery<'q>, value: &Value) -> AnyQuery<'q> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
        Value::Bytes(b) => query.bind(b.clone()),
    }
}

/// Build a query with all arguments bound in order
pub(crate) fn bind_values<'q>(sql: &'q str, args: &[Value]) -> AnyQuery<'q> {
    args.iter().fold(sqlx::query(sql), bind_value)
}

pub(crate) async fn execute<'c, E>(executor: E, sql: &str, args: &[Value]) -> SqlResult<ExecResult>
where
    E: Executor<'c, Database = Any>,
{
    let result = bind_values(sql, args).execute(executor).await?;
    Ok(result.into())
}

/// Execute on one connection and fill in the generated id where the driver
/// leaves it out
pub(crate) async fn execute_on(
    conn: &mut AnyConnection,
    driver: Driver,
    sql: &str,
    args: &[Value],
) -> SqlResult<ExecResult> {
    let result = execute(&mut *conn, sql, args).await?;
    with_last_insert_id(conn, driver, result).await
}

/// The sqlx `Any` adapter for SQLite drops the rowid, so read it back on the
/// connection that ran the statement
pub(crate) async fn with_last_insert_id(
    conn: &mut AnyConnection,
    driver: Driver,
    mut result: ExecResult,
) -> SqlResult<ExecResult> {
    if driver == Driver::Sqlite && result.last_insert_id.is_none() {
        let (id,): (i64,) = sqlx::query_as("SELECT last_insert_rowid()")
            .fetch_one(&mut *conn)
            .await?;
        result.last_insert_id = Some(id);
    }
    Ok(result)
}

/// Run a batch of statements without arguments
///
/// The text is sent as is, so it may contain several statements separated by
/// `;` (used for migrations).
pub(crate) async fn execute_batch<'c, E>(executor: E, sql: &str) -> SqlResult<ExecResult>
where
    E: Executor<'c, Database = Any>,
{
    let result = executor.execute(sql).await?;
    Ok(result.into())
}

pub(crate) async fn fetch_all<'c, E>(executor: E, sql: &str, args: &[Value]) -> SqlResult<Rows>
where
    E: Executor<'c, Database = Any>,
{
    let rows = bind_values(sql, args).fetch_all(executor).await?;
    let rows = rows.iter().map(convert_row).collect::<SqlResult<Vec<_>>>()?;
    Ok(Rows::new(rows))
}

pub(crate) async fn fetch_optional<'c, E>(executor: E, sql: &str, args: &[Value]) -> SqlResult<Option<Row>>
where
    E: Executor<'c, Database = Any>,
{
    match bind_values(sql, args).fetch_optional(executor).await? {
        Some(row) => Ok(Some(convert_row(&row)?)),
        None => Ok(None),
    }
}

/// Stream rows into `f` one at a time; the first error stops the iteration
pub(crate) async fn for_each<'c, E, F>(executor: E, sql: &str, args: &[Value], mut f: F) -> SqlResult<()>
where
    E: Executor<'c, Database = Any>,
    F: FnMut(Row) -> SqlResult<()> + Send,
{
    let mut stream = bind_values(sql, args).fetch(executor);
    while let Some(row) = stream.try_next().await? {
        f(convert_row(&row)?)?;
    }
    Ok(())
}

/// Convert a driver row into an owned [`Row`]
pub(crate) fn convert_row(row: &AnyRow) -> SqlResult<Row> {
    let columns = row.columns().iter().map(|c| c.name().to_string()).collect();
    let values = (0..row.len())
        .map(|index| any_value_to_value(row, index))
        .collect::<SqlResult<Vec<_>>>()?;
    Ok(Row::new(columns, values))
}

/// Decode one column by the type the driver reported for its value
fn any_value_to_value(row: &AnyRow, index: usize) -> SqlResult<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOLEAN" => Value::Bool(row.try_get(index)?),
        "SMALLINT" => Value::Int(row.try_get::<i16, _>(index)? as i64),
        "INTEGER" => Value::Int(row.try_get::<i32, _>(index)? as i64),
        "BIGINT" => Value::Int(row.try_get(index)?),
        "REAL" => Value::Float(row.try_get::<f32, _>(index)? as f64),
        "DOUBLE" => Value::Float(row.try_get(index)?),
        "TEXT" => Value::Text(row.try_get(index)?),
        "BLOB" => Value::Bytes(row.try_get(index)?),
        other => {
            return Err(Error::Decode(format!(
                "unsupported column type {} for column {}",
                other, index
            )))
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::any::AnyPoolOptions;

    async fn memory_pool() -> sqlx::AnyPool {
        crate::backends::install_drivers();
        AnyPoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_execute_and_fetch() {
        let pool = memory_pool().await;
        execute_batch(
            &pool,
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, price REAL, data BLOB);",
        )
        .await
        .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let result = execute_on(
            &mut conn,
            Driver::Sqlite,
            "INSERT INTO items (name, price, data) VALUES ($1, $2, $3)",
            &[Value::from("pen"), Value::Float(1.5), Value::Bytes(vec![1, 2])],
        )
        .await
        .unwrap();
        assert_eq!(result.rows_affected(), 1);
        assert_eq!(result.last_insert_id(), Some(1));
        drop(conn);

        execute(&pool, "INSERT INTO items (name) VALUES ($1)", &[Value::Null])
            .await
            .unwrap();

        let rows = fetch_all(&pool, "SELECT id, name, price, data FROM items ORDER BY id", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);

        let first = rows.first().unwrap();
        assert_eq!(first.columns(), &["id", "name", "price", "data"]);
        assert_eq!(first.values()[0], Value::Int(1));
        assert_eq!(first.values()[1], Value::from("pen"));
        assert_eq!(first.values()[2], Value::Float(1.5));
        assert_eq!(first.values()[3], Value::Bytes(vec![1, 2]));

        let second = rows.iter().nth(1).unwrap();
        assert!(second.values()[1].is_null());
    }

    #[tokio::test]
    async fn test_fetch_optional_and_for_each() {
        let pool = memory_pool().await;
        execute_batch(
            &pool,
            "CREATE TABLE t (id INTEGER PRIMARY KEY); INSERT INTO t (id) VALUES (1), (2), (3);",
        )
        .await
        .unwrap();

        let missing = fetch_optional(&pool, "SELECT id FROM t WHERE id = $1", &[Value::Int(9)])
            .await
            .unwrap();
        assert!(missing.is_none());

        let mut seen = Vec::new();
        for_each(&pool, "SELECT id FROM t ORDER BY id", &[], |row| {
            seen.push(row.get::<i64>(0)?);
            Ok(())
        })
        .await
        .unwrap();
        assert_eq!(seen, vec![1, 2, 3]);

        let err = for_each(&pool, "SELECT id FROM t ORDER BY id", &[], |_| Err(Error::NoRows))
            .await
            .unwrap_err();
        assert!(err.is_no_rows());
    }

    #[tokio::test]
    async fn test_sqlite_autoincrement_id() {
        let pool = memory_pool().await;
        execute_batch(
            &pool,
            "CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL);",
        )
        .await
        .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        for expected in 1..=3 {
            let result = execute_on(&mut conn, Driver::Sqlite, "INSERT INTO notes (body) VALUES ($1)", &[Value::from("x")])
                .await
                .unwrap();
            assert_eq!(result.last_insert_id(), Some(expected));
        }

        let result = with_last_insert_id(&mut conn, Driver::Postgres, ExecResult::new(1, None))
            .await
            .unwrap();
        assert_eq!(result.last_insert_id(), None);
    }
}
