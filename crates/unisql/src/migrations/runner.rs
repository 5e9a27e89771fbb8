//! Migration Runner - Executes migrations against the database
//!
//! Each section runs as one batch. Unless the section opts out with
//! `transaction:false`, the batch and the `schema_migrations` bookkeeping
//! share one transaction.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use sqlx::AnyPool;

use super::definitions::{Migration, MigrationConfig, MigrationRunResult, MigrationSection, MigrationStatus, RollbackResult};
use super::manager::MigrationManager;
use crate::backends::executor;
use crate::backends::Driver;
use crate::error::{Error, SqlResult};
use crate::value::Value;

const TARGET: &str = "unisql::migrations";

fn migration_error(context: impl Into<String>) -> impl FnOnce(Error) -> Error {
    let context = context.into();
    move |e| match e {
        Error::Migration(_) => e,
        other => Error::Migration(format!("{}: {}", context, other)),
    }
}

/// Applies and rolls back migrations from one directory
#[derive(Debug, Clone)]
pub struct Migrator {
    manager: MigrationManager,
    driver: Driver,
}

impl Migrator {
    pub fn new(config: MigrationConfig, driver: Driver) -> Self {
        Self {
            manager: MigrationManager::with_config(config),
            driver,
        }
    }

    pub fn manager(&self) -> &MigrationManager {
        &self.manager
    }

    fn table(&self) -> &str {
        &self.manager.config().migrations_table
    }

    /// Create a new, empty migration file
    pub fn create(&self, name: &str) -> SqlResult<PathBuf> {
        self.manager.create_migration(name)
    }

    /// Apply every pending migration in version order
    pub async fn migrate(&self, pool: &AnyPool) -> SqlResult<MigrationRunResult> {
        let start_time = Instant::now();

        let migrations = self.manager.load_migrations()?;
        self.ensure_migrations_table(pool).await?;
        let applied = self.applied_versions(pool).await?;

        let mut result = MigrationRunResult::default();
        for migration in &migrations {
            if applied.contains(&migration.version) {
                result.skipped_count += 1;
                continue;
            }

            tracing::info!(target: TARGET, "Applying: {}", migration.file_name);
            let insert = format!(
                "INSERT INTO {} (version) VALUES ({})",
                self.table(),
                self.driver.parameter_placeholder(0)
            );
            self.run_section(pool, migration, &migration.up, &insert).await?;
            result.applied_migrations.push(migration.version.clone());
        }

        result.execution_time_ms = start_time.elapsed().as_millis();
        Ok(result)
    }

    /// Roll back the most recently applied migration
    pub async fn rollback(&self, pool: &AnyPool) -> SqlResult<RollbackResult> {
        let start_time = Instant::now();

        let migrations = self.manager.load_migrations()?;
        self.ensure_migrations_table(pool).await?;
        let applied = self.applied_versions(pool).await?;

        let latest = applied
            .iter()
            .max()
            .ok_or_else(|| Error::Migration("can't rollback: no migrations have been applied".to_string()))?;

        let migration = migrations
            .iter()
            .find(|m| &m.version == latest)
            .ok_or_else(|| Error::Migration(format!("can't find migration file: {}", latest)))?;

        tracing::info!(target: TARGET, "Rolling back: {}", migration.file_name);
        let down = migration.down.clone().unwrap_or(MigrationSection {
            sql: String::new(),
            transaction: true,
        });
        let delete = format!(
            "DELETE FROM {} WHERE version = {}",
            self.table(),
            self.driver.parameter_placeholder(0)
        );
        self.run_section(pool, migration, &down, &delete).await?;

        Ok(RollbackResult {
            version: migration.version.clone(),
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Every migration file with its applied flag
    pub async fn status(&self, pool: &AnyPool) -> SqlResult<Vec<MigrationStatus>> {
        let migrations = self.manager.load_migrations()?;
        self.ensure_migrations_table(pool).await?;
        let applied = self.applied_versions(pool).await?;

        Ok(migrations
            .into_iter()
            .map(|migration| MigrationStatus {
                applied: applied.contains(&migration.version),
                migration,
            })
            .collect())
    }

    /// Run one section plus the bookkeeping statement (bound to the version)
    async fn run_section(
        &self,
        pool: &AnyPool,
        migration: &Migration,
        section: &MigrationSection,
        bookkeeping: &str,
    ) -> SqlResult<()> {
        let version = [Value::Text(migration.version.clone())];
        let context = migration.file_name.clone();

        if section.transaction {
            let mut tx = pool.begin().await.map_err(|e| migration_error(context.clone())(e.into()))?;
            if !section.sql.is_empty() {
                executor::execute_batch(&mut *tx, &section.sql)
                    .await
                    .map_err(migration_error(context.clone()))?;
            }
            executor::execute(&mut *tx, bookkeeping, &version)
                .await
                .map_err(migration_error(context.clone()))?;
            tx.commit().await.map_err(|e| migration_error(context)(e.into()))?;
        } else {
            if !section.sql.is_empty() {
                executor::execute_batch(pool, &section.sql)
                    .await
                    .map_err(migration_error(context.clone()))?;
            }
            executor::execute(pool, bookkeeping, &version)
                .await
                .map_err(migration_error(context))?;
        }

        Ok(())
    }

    async fn ensure_migrations_table(&self, pool: &AnyPool) -> SqlResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (version VARCHAR(128) PRIMARY KEY)",
            self.table()
        );
        executor::execute_batch(pool, &sql)
            .await
            .map_err(migration_error("failed to create migrations table"))?;
        Ok(())
    }

    async fn applied_versions(&self, pool: &AnyPool) -> SqlResult<HashSet<String>> {
        let sql = format!("SELECT version FROM {} ORDER BY version", self.table());
        let rows = executor::fetch_all(pool, &sql, &[])
            .await
            .map_err(migration_error("failed to query applied migrations"))?;

        rows.iter()
            .map(|row| row.get::<String>(0))
            .collect::<SqlResult<HashSet<_>>>()
            .map_err(migration_error("failed to read applied migrations"))
    }
}
