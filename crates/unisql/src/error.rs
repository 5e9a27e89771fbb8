//! Error types for unisql
//!
//! Every fallible operation returns [`SqlResult`]; driver failures are carried
//! through unchanged inside [`Error::Database`].

/// Result type alias used across the crate
pub type SqlResult<T> = Result<T, Error>;

/// Error types for engine, transaction, record and migration operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection URL could not be parsed
    #[error("unable to parse URL: {0}")]
    Url(#[from] url::ParseError),

    /// The connection URL has no scheme
    #[error("protocol scheme is not defined")]
    MissingScheme,

    /// The connection URL names a driver we do not support
    #[error("unsupported protocol scheme: {0}")]
    UnsupportedScheme(String),

    /// Invalid configuration value
    #[error("invalid configuration for {field}: got '{value}', expected {expected}")]
    Config {
        field: String,
        value: String,
        expected: String,
    },

    /// Migration loading or execution failed
    #[error("DB migration error: {0}")]
    Migration(String),

    /// The connection pool could not be opened
    #[error("DB open error: {0}")]
    Open(String),

    /// Error reported by the underlying driver
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A single-row query returned nothing
    #[error("no rows in result set")]
    NoRows,

    /// Destination and result shapes do not match
    #[error("expected {expected} destination columns in scan, got {actual}")]
    Scan { expected: usize, actual: usize },

    /// A column value could not be converted to the requested type
    #[error("decode error: {0}")]
    Decode(String),

    /// SQL could not be generated for a record
    #[error("statement error: {0}")]
    Statement(String),

    /// The transaction body failed and rolling back failed too
    #[error("{source} (rollback failed: {rollback})")]
    Rollback {
        source: Box<Error>,
        rollback: Box<Error>,
    },

    /// The transaction was already committed or rolled back
    #[error("transaction has already been committed or rolled back")]
    TransactionClosed,
}

impl Error {
    /// Whether this error means "the query matched no row"
    pub fn is_no_rows(&self) -> bool {
        match self {
            Error::NoRows => true,
            Error::Database(sqlx::Error::RowNotFound) => true,
            _ => false,
        }
    }

    pub(crate) fn config(field: &str, value: impl Into<String>, expected: &str) -> Self {
        Error::Config {
            field: field.to_string(),
            value: value.into(),
            expected: expected.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(Error::MissingScheme.to_string(), "protocol scheme is not defined");
        assert_eq!(
            Error::UnsupportedScheme("example".to_string()).to_string(),
            "unsupported protocol scheme: example"
        );
        assert_eq!(
            Error::Migration("no such table".to_string()).to_string(),
            "DB migration error: no such table"
        );
        assert_eq!(
            Error::Open("refused".to_string()).to_string(),
            "DB open error: refused"
        );
    }

    #[test]
    fn test_rollback_error_keeps_both_causes() {
        let err = Error::Rollback {
            source: Box::new(Error::NoRows),
            rollback: Box::new(Error::TransactionClosed),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("no rows in result set"));
        assert!(msg.contains("rollback failed"));
    }

    #[test]
    fn test_no_rows_detection() {
        assert!(Error::NoRows.is_no_rows());
        assert!(Error::Database(sqlx::Error::RowNotFound).is_no_rows());
        assert!(!Error::MissingScheme.is_no_rows());
    }
}
