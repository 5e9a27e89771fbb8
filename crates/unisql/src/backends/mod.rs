//! Database Backend Abstractions
//!
//! One [`Driver`] value per supported engine. Execution itself goes through the
//! sqlx `Any` driver; this module only carries the per-engine differences:
//! URL schemes, placeholder style and driver registration.

pub mod executor;

use std::borrow::Cow;
use std::sync::Once;

use once_cell::sync::Lazy;
use regex::Regex;

static SQL_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\d+").expect("valid placeholder regex"));

static INSTALL_DRIVERS: Once = Once::new();

/// Database driver enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    MySql,
    Postgres,
    Sqlite,
}

impl Driver {
    /// URL schemes accepted for each driver
    pub const SCHEMES: [&'static str; 5] = ["mysql", "postgres", "postgresql", "sqlite", "sqlite3"];

    /// Rewrite `$N` placeholders into the style this driver understands.
    ///
    /// Queries are always written PostgreSQL style. MySQL only knows `?`, while
    /// PostgreSQL and SQLite accept `$N` as is.
    pub fn fix_query<'a>(&self, query: &'a str) -> Cow<'a, str> {
        match self {
            Driver::MySql => SQL_PARAM.replace_all(query, "?"),
            Driver::Postgres | Driver::Sqlite => Cow::Borrowed(query),
        }
    }

    /// Placeholder for the zero-based parameter `index` in native syntax
    pub fn parameter_placeholder(&self, index: usize) -> String {
        match self {
            Driver::MySql => "?".to_string(),
            Driver::Postgres | Driver::Sqlite => format!("${}", index + 1),
        }
    }

    /// Canonical URL scheme passed to the driver layer
    pub fn scheme(&self) -> &'static str {
        match self {
            Driver::MySql => "mysql",
            Driver::Postgres => "postgres",
            Driver::Sqlite => "sqlite",
        }
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.scheme())
    }
}

impl std::str::FromStr for Driver {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" => Ok(Driver::MySql),
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "" => Err(crate::error::Error::MissingScheme),
            _ => Err(crate::error::Error::UnsupportedScheme(s.to_string())),
        }
    }
}

/// Register the sqlx `Any` drivers. Safe to call any number of times.
pub fn install_drivers() {
    INSTALL_DRIVERS.call_once(|| {
        sqlx::any::install_default_drivers();
        tracing::debug!("sqlx any drivers installed");
    });
}
