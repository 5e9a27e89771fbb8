//! Record metadata
//!
//! A record is a struct whose fields map to the columns of one table. The
//! mapping is declared with `#[derive(Record)]`:
//!
//! ```
//! use unisql::Record;
//!
//! #[derive(Debug, Default, Record)]
//! #[record(table = "users")]
//! struct User {
//!     id: i64,
//!     name: String,
//!     #[record(column = "created_at")]
//!     created: i64,
//!     #[record(skip)]
//!     cached_label: Option<String>,
//! }
//!
//! assert_eq!(User::table(), "users");
//! assert_eq!(User::fields(), &["id", "name", "created_at"]);
//! ```

use crate::row::Scan;
use crate::value::Value;

/// Column holding the record identity
pub const ID_COLUMN: &str = "id";

/// Set to the current time on insert
pub const CREATED_AT_COLUMN: &str = "created_at";

/// Set to the current time on insert and update
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Table mapping for a struct
///
/// `fields()` and `values()` are aligned: the value at position `i` belongs to
/// the column at position `i`. Scanning a record reads the mapped columns in
/// the same order.
pub trait Record: Scan + Sync {
    /// Table name
    fn table() -> &'static str;

    /// Mapped column names in declaration order
    fn fields() -> &'static [&'static str];

    /// Current field values, aligned with [`Record::fields`]
    fn values(&self) -> Vec<Value>;

    /// Value of the `id` column, if the record maps one
    fn id(&self) -> Option<i64> {
        let index = Self::fields().iter().position(|f| *f == ID_COLUMN)?;
        self.values().get(index).and_then(Value::as_i64)
    }

    /// Whether the record maps an `id` column
    fn has_id() -> bool {
        Self::fields().contains(&ID_COLUMN)
    }
}
