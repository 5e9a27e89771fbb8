//! SQL generation for records
//!
//! Statements are generated with `$N` placeholders; the executing driver
//! rewrites them when it needs another style.

use crate::error::{Error, SqlResult};
use crate::record::{Record, CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};
use crate::value::Value;

/// A query together with its arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    pub query: String,
    pub args: Vec<Value>,
}

impl Prepared {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// Bundle a query and its arguments
pub fn prepare_sql(query: impl Into<String>, args: Vec<Value>) -> Prepared {
    Prepared {
        query: query.into(),
        args,
    }
}

/// Current unix timestamp in seconds (UTC)
pub fn current_unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// `INSERT INTO t (..) VALUES (..)`, skipping `id` and stamping
/// `created_at`/`updated_at` with `now`
pub fn insert_row<R: Record>(row: &R, now: i64) -> SqlResult<Prepared> {
    let mut fields = Vec::new();
    let mut placeholders = Vec::new();
    let mut args = Vec::new();

    for (field, value) in R::fields().iter().zip(row.values()) {
        if *field == ID_COLUMN {
            continue;
        }
        fields.push(*field);
        placeholders.push(format!("${}", args.len() + 1));
        if *field == CREATED_AT_COLUMN || *field == UPDATED_AT_COLUMN {
            args.push(Value::Int(now));
        } else {
            args.push(value);
        }
    }

    if fields.is_empty() {
        return Err(Error::Statement(format!(
            "record for table '{}' has no insertable columns",
            R::table()
        )));
    }

    Ok(Prepared {
        query: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            R::table(),
            fields.join(", "),
            placeholders.join(", ")
        ),
        args,
    })
}

/// `UPDATE t SET .. WHERE id = $N`
///
/// `id` and `created_at` are never updated and `updated_at` is stamped with
/// `now`. A non-empty `only` restricts the SET list to those columns; names
/// the record does not map are ignored.
pub fn update_row<R: Record>(row: &R, only: &[&str], now: i64) -> SqlResult<Prepared> {
    if !R::has_id() {
        return Err(Error::Statement(format!(
            "record for table '{}' has no '{}' column",
            R::table(),
            ID_COLUMN
        )));
    }

    let mut id = Value::Null;
    let mut assignments = Vec::new();
    let mut args = Vec::new();

    for (field, value) in R::fields().iter().zip(row.values()) {
        if *field == ID_COLUMN {
            id = value;
            continue;
        }
        if *field == CREATED_AT_COLUMN {
            continue;
        }
        if !only.is_empty() && !only.contains(field) {
            continue;
        }
        assignments.push(format!("{} = ${}", field, args.len() + 1));
        if *field == UPDATED_AT_COLUMN {
            args.push(Value::Int(now));
        } else {
            args.push(value);
        }
    }

    if assignments.is_empty() {
        return Err(Error::Statement(format!(
            "nothing to update in table '{}'",
            R::table()
        )));
    }

    let position = args.len() + 1;
    args.push(id);

    Ok(Prepared {
        query: format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            R::table(),
            assignments.join(", "),
            ID_COLUMN,
            position
        ),
        args,
    })
}

/// `SELECT <fields> FROM t WHERE id = $1 LIMIT 1`
pub fn query_row_by_id<R: Record>() -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = $1 LIMIT 1",
        R::fields().join(", "),
        R::table(),
        ID_COLUMN
    )
}

/// `DELETE FROM t WHERE id = $1`
pub fn delete_row_by_id<R: Record>() -> String {
    format!("DELETE FROM {} WHERE {} = $1", R::table(), ID_COLUMN)
}

/// `SELECT 1 FROM t WHERE id = $1 LIMIT 1`
pub fn row_exists<R: Record>() -> String {
    format!("SELECT 1 FROM {} WHERE {} = $1 LIMIT 1", R::table(), ID_COLUMN)
}
