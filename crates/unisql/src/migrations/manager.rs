//! Migration Manager - File system operations for migrations
//!
//! Creates, loads and parses migration files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use super::definitions::{Migration, MigrationConfig, MigrationSection};
use crate::error::{Error, SqlResult};

static FILE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)_(.+)\.sql$").expect("valid file name regex"));
static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--\s*migrate:(up|down)\b(.*)$").expect("valid marker regex"));

/// Migration manager for creating and loading migration files
#[derive(Debug, Clone, Default)]
pub struct MigrationManager {
    config: MigrationConfig,
}

impl MigrationManager {
    /// Create a new migration manager with default configuration
    pub fn new() -> Self {
        Self::with_config(MigrationConfig::default())
    }

    /// Create a new migration manager with custom configuration
    pub fn with_config(config: MigrationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Write `<YYYYMMDDHHMMSS>_<name>.sql` with empty up/down sections and
    /// return its path
    pub fn create_migration(&self, name: &str) -> SqlResult<PathBuf> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(Error::Migration(format!("invalid migration name '{}'", name)));
        }

        fs::create_dir_all(&self.config.migrations_dir)
            .map_err(|e| Error::Migration(format!("failed to create migrations directory: {}", e)))?;

        let file_name = format!("{}_{}.sql", Utc::now().format("%Y%m%d%H%M%S"), name);
        let path = self.config.migrations_dir.join(&file_name);
        if path.exists() {
            return Err(Error::Migration(format!("file already exists: {}", path.display())));
        }

        fs::write(&path, "-- migrate:up\n\n\n-- migrate:down\n\n")
            .map_err(|e| Error::Migration(format!("failed to write migration file: {}", e)))?;

        tracing::info!(target: "unisql::migrations", "Created migration {}", path.display());
        Ok(path)
    }

    /// Load every migration file, sorted by version. Files that do not match
    /// `<digits>_<name>.sql` are ignored.
    pub fn load_migrations(&self) -> SqlResult<Vec<Migration>> {
        let dir = &self.config.migrations_dir;
        if !dir.is_dir() {
            return Err(Error::Migration(format!(
                "could not find migrations directory '{}'",
                dir.display()
            )));
        }

        let entries = fs::read_dir(dir)
            .map_err(|e| Error::Migration(format!("failed to read migrations directory: {}", e)))?;

        let mut migrations = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::Migration(format!("failed to read directory entry: {}", e)))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(migration) = self.load_migration_file(&path)? {
                migrations.push(migration);
            }
        }

        migrations.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.file_name.cmp(&b.file_name)));
        Ok(migrations)
    }

    fn load_migration_file(&self, path: &Path) -> SqlResult<Option<Migration>> {
        let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
            return Ok(None);
        };
        if !FILE_NAME.is_match(file_name) {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Migration(format!("failed to read {}: {}", file_name, e)))?;
        parse_migration(file_name, &content).map(Some)
    }
}

/// Parse one migration file
pub fn parse_migration(file_name: &str, content: &str) -> SqlResult<Migration> {
    let captures = FILE_NAME
        .captures(file_name)
        .ok_or_else(|| Error::Migration(format!("invalid migration file name '{}'", file_name)))?;
    let version = captures[1].to_string();
    let name = captures[2].to_string();

    let mut up: Option<(bool, Vec<&str>)> = None;
    let mut down: Option<(bool, Vec<&str>)> = None;
    let mut in_up = false;

    for line in content.lines() {
        if let Some(marker) = MARKER.captures(line.trim()) {
            let transaction = parse_options(&marker[2], file_name)?;
            in_up = &marker[1] == "up";
            let section = if in_up { &mut up } else { &mut down };
            if section.is_some() {
                return Err(Error::Migration(format!(
                    "duplicate migrate:{} block in {}",
                    &marker[1], file_name
                )));
            }
            *section = Some((transaction, Vec::new()));
            continue;
        }

        let section = if in_up { up.as_mut() } else { down.as_mut() };
        if let Some((_, lines)) = section {
            lines.push(line);
        }
    }

    let (up_transaction, up_lines) =
        up.ok_or_else(|| Error::Migration(format!("{}: migration is missing the migrate:up block", file_name)))?;

    Ok(Migration {
        version,
        name,
        file_name: file_name.to_string(),
        up: MigrationSection {
            sql: up_lines.join("\n").trim().to_string(),
            transaction: up_transaction,
        },
        down: down.map(|(transaction, lines)| MigrationSection {
            sql: lines.join("\n").trim().to_string(),
            transaction,
        }),
    })
}

/// Marker options, e.g. `transaction:false`. Returns whether the section runs
/// in a transaction.
fn parse_options(options: &str, file_name: &str) -> SqlResult<bool> {
    let mut transaction = true;
    for option in options.split_whitespace() {
        match option.split_once(':') {
            Some(("transaction", "true")) => transaction = true,
            Some(("transaction", "false")) => transaction = false,
            _ => {
                return Err(Error::Migration(format!(
                    "{}: unknown migration option '{}'",
                    file_name, option
                )))
            }
        }
    }
    Ok(transaction)
}
