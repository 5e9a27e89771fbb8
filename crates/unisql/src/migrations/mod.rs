//! Schema migrations
//!
//! Plain SQL files in the dbmate layout: `<version>_<name>.sql`, each with a
//! `-- migrate:up` section and an optional `-- migrate:down` section. Applied
//! versions are tracked in `schema_migrations`.

pub mod definitions;
pub mod manager;
pub mod runner;

pub use definitions::{
    Migration, MigrationConfig, MigrationRunResult, MigrationSection, MigrationStatus, RollbackResult,
};
pub use manager::MigrationManager;
pub use runner::Migrator;
