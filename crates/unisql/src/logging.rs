//! SQL statement logging
//!
//! When debug mode is on, every operation reports one line on the
//! `unisql::sql` tracing target:
//!
//! ```text
//! [SQL] [TX] [func Exec] INSERT INTO users (name) VALUES ($1); ([John]) (nil) 0.412 ms
//! ```
//!
//! Nothing here installs a subscriber unless [`init_logging`] is called.

use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Error, SqlResult};
use crate::value::{format_args_list, Value};

/// Target used for every SQL log line
pub const SQL_TARGET: &str = "unisql::sql";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static TRAILING_SEMICOLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+;$").expect("valid semicolon regex"));

/// Collapse whitespace runs and trim, so multi-line SQL logs on one line
pub fn normalize_query(query: &str) -> String {
    let collapsed = WHITESPACE.replace_all(query, " ");
    TRAILING_SEMICOLON.replace(collapsed.trim(), ";").into_owned()
}

/// One SQL log line
#[derive(Debug, Clone)]
pub struct SqlLog<'a> {
    func: &'a str,
    query: &'a str,
    args: &'a [Value],
    error: Option<String>,
    elapsed: Duration,
    tx: bool,
}

impl<'a> SqlLog<'a> {
    pub fn new(func: &'a str, query: &'a str, args: &'a [Value]) -> Self {
        Self {
            func,
            query,
            args,
            error: None,
            elapsed: Duration::ZERO,
            tx: false,
        }
    }

    pub fn tx(mut self, tx: bool) -> Self {
        self.tx = tx;
        self
    }

    pub fn elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn error(mut self, error: Option<&Error>) -> Self {
        self.error = error.map(|e| e.to_string());
        self
    }

    /// Elapsed time in milliseconds with microsecond precision
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Send the line to the `unisql::sql` target: info on success, warn on
    /// failure
    pub fn emit(&self) {
        let elapsed_ms = self.elapsed_ms();
        if self.error.is_some() {
            tracing::warn!(target: SQL_TARGET, func = self.func, tx = self.tx, elapsed_ms, "{}", self);
        } else {
            tracing::info!(target: SQL_TARGET, func = self.func, tx = self.tx, elapsed_ms, "{}", self);
        }
    }
}

impl fmt::Display for SqlLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[SQL]")?;
        if self.tx {
            write!(f, " [TX]")?;
        }
        if !self.func.is_empty() {
            write!(f, " [func {}]", self.func)?;
        }
        if !self.query.is_empty() {
            write!(f, " {}", normalize_query(self.query))?;
        }
        if self.args.is_empty() {
            write!(f, " (empty)")?;
        } else {
            write!(f, " ({})", format_args_list(self.args))?;
        }
        match &self.error {
            Some(e) => write!(f, " ({})", e)?,
            None => write!(f, " (nil)")?,
        }
        write!(f, " {:.3} ms", self.elapsed_ms())
    }
}

/// Emit the log line for one finished call when `debug` is on
pub(crate) fn log_call<T>(
    debug: bool,
    tx: bool,
    func: &str,
    query: &str,
    args: &[Value],
    start: Instant,
    result: &SqlResult<T>,
) {
    if !debug {
        return;
    }
    SqlLog::new(func, query, args)
        .tx(tx)
        .elapsed(start.elapsed())
        .error(result.as_ref().err())
        .emit();
}

/// Subscriber setup for applications and examples
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of plain text
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn json(mut self) -> Self {
        self.json_format = true;
        self
    }
}

/// Install a global fmt subscriber. `RUST_LOG` wins over `config.level`.
///
/// Returns an error if a global subscriber is already set.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout).json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout))
            .try_init()?;
    }

    Ok(())
}
