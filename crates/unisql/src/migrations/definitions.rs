//! Migration Definitions - Core types shared by the manager and the runner

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MIGRATIONS_DIR;

/// Name of the tracking table
pub const MIGRATIONS_TABLE: &str = "schema_migrations";

/// One section of a migration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationSection {
    /// Statements, executed as a single batch
    pub sql: String,
    /// Run inside a transaction together with the version bookkeeping.
    /// Disabled with `transaction:false` on the section marker.
    pub transaction: bool,
}

/// A migration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    /// Digit prefix of the file name
    pub version: String,
    /// Rest of the file name without the extension
    pub name: String,
    pub file_name: String,
    pub up: MigrationSection,
    pub down: Option<MigrationSection>,
}

/// Configuration for the migration system
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Directory where migration files are stored
    pub migrations_dir: PathBuf,
    /// Table name for tracking migrations
    pub migrations_table: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            migrations_table: MIGRATIONS_TABLE.to_string(),
        }
    }
}

impl MigrationConfig {
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: dir.into(),
            ..Self::default()
        }
    }
}

/// A migration file and whether it has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub migration: Migration,
    pub applied: bool,
}

/// Result of running migrations
#[derive(Debug, Default)]
pub struct MigrationRunResult {
    /// Versions applied by this run, in order
    pub applied_migrations: Vec<String>,
    /// Number of migrations that were already applied
    pub skipped_count: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl MigrationRunResult {
    pub fn applied_count(&self) -> usize {
        self.applied_migrations.len()
    }
}

/// Result of rolling back the latest migration
#[derive(Debug)]
pub struct RollbackResult {
    pub version: String,
    pub execution_time_ms: u128,
}
