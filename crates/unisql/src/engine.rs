//! Engine - the unified database handle
//!
//! One [`Engine`] wraps a connection pool for MySQL, PostgreSQL or SQLite.
//! Opening it creates the database when missing and applies pending
//! migrations.

use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::any::{Any, AnyStatement};
use sqlx::migrate::MigrateDatabase;
use sqlx::{AnyPool, Connection, Executor, Statement as _, Transaction};

use crate::backends::executor::{self, ExecResult};
use crate::backends::{install_drivers, Driver};
use crate::config::DatabaseConfig;
use crate::error::{Error, SqlResult};
use crate::logging::log_call;
use crate::migrations::{MigrationConfig, Migrator};
use crate::queryable::Queryable;
use crate::row::{Row, Rows};
use crate::tx::{TransactionConfig, Tx};
use crate::url::DatabaseUrl;
use crate::value::Value;

/// Connection pool plus driver settings
#[derive(Debug, Clone)]
pub struct Engine {
    pool: AnyPool,
    url: DatabaseUrl,
    debug: bool,
}

impl Engine {
    /// Open the database described by `config`
    ///
    /// Creates the database when it does not exist, builds the pool and runs
    /// pending migrations unless `skip_migration` is set.
    pub async fn connect(config: DatabaseConfig) -> SqlResult<Self> {
        let start = Instant::now();
        config.validate()?;
        let url = DatabaseUrl::parse(&config.url)?;
        let connect_url = url.connect_url();

        install_drivers();

        let exists = Any::database_exists(&connect_url)
            .await
            .map_err(|e| Error::Open(e.to_string()))?;
        if !exists {
            tracing::info!("Creating database {}", url);
            Any::create_database(&connect_url)
                .await
                .map_err(|e| Error::Open(e.to_string()))?;
        }

        let pool = config
            .pool
            .pool_options()
            .connect(&connect_url)
            .await
            .map_err(|e| Error::Open(e.to_string()));
        log_call(config.debug, false, "Open", "", &[], start, &pool);
        let pool = pool?;

        if !config.skip_migration {
            let migrator = Migrator::new(MigrationConfig::with_dir(config.migrations_dir()), url.driver());
            let result = migrator.migrate(&pool).await?;
            if result.applied_count() > 0 {
                tracing::info!("Applied {} migration(s) in {} ms", result.applied_count(), result.execution_time_ms);
            }
        }

        Ok(Self {
            pool,
            url,
            debug: config.debug,
        })
    }

    /// Set the debug flag after opening
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn url(&self) -> &DatabaseUrl {
        &self.url
    }

    /// Migrator bound to this engine's driver
    pub fn migrator(&self, config: MigrationConfig) -> Migrator {
        Migrator::new(config, self.url.driver())
    }

    /// Start a transaction with the driver defaults
    pub async fn begin(&self) -> SqlResult<Tx> {
        self.begin_with(TransactionConfig::default()).await
    }

    /// Start a transaction with an isolation level and/or read-only mode
    ///
    /// MySQL takes the options before `BEGIN`, PostgreSQL right after it.
    /// SQLite transactions are always serializable, so the options are ignored
    /// there.
    pub async fn begin_with(&self, config: TransactionConfig) -> SqlResult<Tx> {
        let start = Instant::now();
        let driver = self.driver();
        let result = async {
            let mut conn = self.pool.acquire().await?;
            if let Some(sql) = config.before_begin(driver) {
                executor::execute_batch(&mut *conn, &sql).await?;
            }
            let mut tx = Transaction::begin(conn).await?;
            for sql in config.after_begin(driver) {
                executor::execute_batch(&mut *tx, &sql).await?;
            }
            Ok::<_, Error>(tx)
        }
        .await;
        log_call(self.debug, true, "Begin", "", &[], start, &result);
        Ok(Tx::new(result?, driver, self.debug))
    }

    /// Close every pooled connection and wait for them to finish
    pub async fn close(&self) -> SqlResult<()> {
        let start = Instant::now();
        self.pool.close().await;
        let result: SqlResult<()> = Ok(());
        log_call(self.debug, false, "Close", "", &[], start, &result);
        result
    }

    /// Check that a connection can be acquired and answers
    pub async fn ping(&self) -> SqlResult<()> {
        let start = Instant::now();
        let result: SqlResult<()> = async {
            let mut conn = self.pool.acquire().await?;
            conn.ping().await?;
            Ok::<(), Error>(())
        }
        .await;
        log_call(self.debug, false, "Ping", "", &[], start, &result);
        result
    }

    /// Prepare a statement for repeated execution
    pub async fn prepare(&self, query: &str) -> SqlResult<Statement> {
        let start = Instant::now();
        let sql = self.driver().fix_query(query).into_owned();
        let result = self
            .pool
            .prepare(sql.as_str())
            .await
            .map(|statement| sqlx::Statement::to_owned(&statement))
            .map_err(Error::from);
        log_call(self.debug, false, "Prepare", &sql, &[], start, &result);

        Ok(Statement {
            pool: self.pool.clone(),
            inner: result?,
            driver: self.driver(),
            debug: self.debug,
        })
    }

    /// Run `f` inside a transaction
    ///
    /// Commits when `f` returns `Ok` and rolls back otherwise. If the rollback
    /// fails too, both errors are returned in [`Error::Rollback`].
    ///
    /// ```no_run
    /// # use unisql::{Engine, Queryable, SqlResult};
    /// # async fn run(engine: &Engine) -> SqlResult<()> {
    /// engine
    ///     .transaction(|tx| {
    ///         Box::pin(async move {
    ///             tx.exec("UPDATE users SET name = $1 WHERE id = $2", &unisql::args!["John", 1]).await?;
    ///             Ok::<_, unisql::Error>(())
    ///         })
    ///     })
    ///     .await
    /// # }
    /// ```
    pub async fn transaction<T, F>(&self, f: F) -> SqlResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t Tx) -> BoxFuture<'t, SqlResult<T>> + Send,
    {
        self.transaction_with(TransactionConfig::default(), f).await
    }

    /// [`Engine::transaction`] with explicit transaction options
    pub async fn transaction_with<T, F>(&self, config: TransactionConfig, f: F) -> SqlResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t Tx) -> BoxFuture<'t, SqlResult<T>> + Send,
    {
        let tx = self.begin_with(config).await?;
        let result = f(&tx).await;

        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(source) => match tx.rollback().await {
                Ok(()) => Err(source),
                Err(rollback) => Err(Error::Rollback {
                    source: Box::new(source),
                    rollback: Box::new(rollback),
                }),
            },
        }
    }
}

#[async_trait]
impl Queryable for Engine {
    fn driver(&self) -> Driver {
        self.url.driver()
    }

    fn is_debug(&self) -> bool {
        self.debug
    }

    async fn exec(&self, query: &str, args: &[Value]) -> SqlResult<ExecResult> {
        let start = Instant::now();
        let sql = self.driver().fix_query(query);
        let result = async {
            let mut conn = self.pool.acquire().await?;
            executor::execute_on(&mut conn, self.driver(), &sql, args).await
        }
        .await;
        log_call(self.debug, false, "Exec", &sql, args, start, &result);
        result
    }

    async fn query(&self, query: &str, args: &[Value]) -> SqlResult<Rows> {
        let start = Instant::now();
        let sql = self.driver().fix_query(query);
        let result = executor::fetch_all(&self.pool, &sql, args).await;
        log_call(self.debug, false, "Query", &sql, args, start, &result);
        result
    }

    async fn query_row(&self, query: &str, args: &[Value]) -> SqlResult<Row> {
        let start = Instant::now();
        let sql = self.driver().fix_query(query);
        let result = executor::fetch_optional(&self.pool, &sql, args)
            .await
            .and_then(|row| row.ok_or(Error::NoRows));
        log_call(self.debug, false, "QueryRow", &sql, args, start, &result);
        result
    }

    async fn each<F>(&self, query: &str, args: &[Value], callback: F) -> SqlResult<()>
    where
        F: FnMut(Row) -> SqlResult<()> + Send,
    {
        let start = Instant::now();
        let sql = self.driver().fix_query(query);
        let result = executor::for_each(&self.pool, &sql, args, callback).await;
        log_call(self.debug, false, "Each", &sql, args, start, &result);
        result
    }
}

/// A statement prepared by [`Engine::prepare`]
pub struct Statement {
    pool: AnyPool,
    inner: AnyStatement<'static>,
    driver: Driver,
    debug: bool,
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement").field("sql", &self.sql()).finish()
    }
}

impl Statement {
    /// SQL as sent to the driver
    pub fn sql(&self) -> &str {
        self.inner.sql()
    }

    pub async fn exec(&self, args: &[Value]) -> SqlResult<ExecResult> {
        let start = Instant::now();
        let query = args.iter().fold(self.inner.query(), executor::bind_value);
        let result = async {
            let mut conn = self.pool.acquire().await?;
            let result = query.execute(&mut *conn).await?;
            executor::with_last_insert_id(&mut conn, self.driver, result.into()).await
        }
        .await;
        log_call(self.debug, false, "Exec", self.sql(), args, start, &result);
        result
    }

    pub async fn query(&self, args: &[Value]) -> SqlResult<Rows> {
        let start = Instant::now();
        let query = args.iter().fold(self.inner.query(), executor::bind_value);
        let result = match query.fetch_all(&self.pool).await {
            Ok(rows) => rows
                .iter()
                .map(executor::convert_row)
                .collect::<SqlResult<Vec<_>>>()
                .map(Rows::new),
            Err(e) => Err(e.into()),
        };
        log_call(self.debug, false, "Query", self.sql(), args, start, &result);
        result
    }

    pub async fn query_row(&self, args: &[Value]) -> SqlResult<Row> {
        let start = Instant::now();
        let query = args.iter().fold(self.inner.query(), executor::bind_value);
        let result = match query.fetch_optional(&self.pool).await {
            Ok(Some(row)) => executor::convert_row(&row),
            Ok(None) => Err(Error::NoRows),
            Err(e) => Err(e.into()),
        };
        log_call(self.debug, false, "QueryRow", self.sql(), args, start, &result);
        result
    }
}

/// Parse `url`, open the engine and apply migrations from `migrations_dir`
/// (`./db/migrations` when empty)
pub async fn open(url: &str, migrations_dir: &str) -> SqlResult<Engine> {
    let mut config = DatabaseConfig::new(url);
    if !migrations_dir.is_empty() {
        config = config.with_migrations_dir(migrations_dir);
    }
    Engine::connect(config).await
}
