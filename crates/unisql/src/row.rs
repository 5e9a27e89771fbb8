//! Query results
//!
//! A [`Row`] owns its column names and decoded values, so it can outlive the
//! connection it came from. [`Scan`] turns a row into a Rust value
//! positionally: the first column fills the first field, and so on.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::error::{Error, SqlResult};
use crate::value::{FromValue, Value};

/// Build a value from a row by column position
///
/// Derive it with `#[derive(Scan)]` for structs, or use the tuple impls:
///
/// ```
/// use unisql::{Row, Scan, Value};
///
/// let row = Row::new(vec!["id".into(), "name".into()], vec![Value::Int(5), Value::from("John")]);
/// let (id, name): (i64, String) = row.scans().unwrap();
/// assert_eq!((id, name.as_str()), (5, "John"));
/// ```
pub trait Scan: Sized + Send {
    fn scan(row: &Row) -> SqlResult<Self>;
}

/// One result row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Raw value at `index`
    pub fn value(&self, index: usize) -> SqlResult<&Value> {
        self.values.get(index).ok_or(Error::Scan {
            expected: index + 1,
            actual: self.values.len(),
        })
    }

    /// Typed value at `index`
    pub fn get<T: FromValue>(&self, index: usize) -> SqlResult<T> {
        let value = self.value(index)?.clone();
        T::from_value(value).map_err(|e| match e {
            Error::Decode(msg) => Error::Decode(format!("column {} ({}): {}", index, self.column_label(index), msg)),
            other => other,
        })
    }

    /// Typed value of the column called `name`
    pub fn get_by_name<T: FromValue>(&self, name: &str) -> SqlResult<T> {
        let index = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::Decode(format!("column '{}' not found", name)))?;
        self.get(index)
    }

    /// Fails unless the row has exactly `expected` columns
    pub fn expect_columns(&self, expected: usize) -> SqlResult<()> {
        if self.values.len() != expected {
            return Err(Error::Scan {
                expected,
                actual: self.values.len(),
            });
        }
        Ok(())
    }

    /// Scan this row into `T`
    pub fn scans<T: Scan>(&self) -> SqlResult<T> {
        T::scan(self)
    }

    pub fn to_map(&self) -> HashMap<String, Value> {
        self.columns.iter().cloned().zip(self.values.iter().cloned()).collect()
    }

    pub fn to_json(&self) -> JsonValue {
        let mut map = serde_json::Map::new();
        for (column, value) in self.columns.iter().zip(&self.values) {
            map.insert(column.clone(), value.to_json());
        }
        JsonValue::Object(map)
    }

    fn column_label(&self, index: usize) -> &str {
        self.columns.get(index).map(String::as_str).unwrap_or("?")
    }
}

/// All rows of a query, in result order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    rows: Vec<Row>,
}

impl Rows {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Scan every row into `T`
    pub fn scans<T: Scan>(&self) -> SqlResult<Vec<T>> {
        self.rows.iter().map(T::scan).collect()
    }

    pub fn into_inner(self) -> Vec<Row> {
        self.rows
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Rows {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

macro_rules! scan_tuple {
    ($len:expr => $($ty:ident : $idx:tt),+) => {
        impl<$($ty: FromValue + Send),+> Scan for ($($ty,)+) {
            fn scan(row: &Row) -> SqlResult<Self> {
                row.expect_columns($len)?;
                Ok(($(row.get::<$ty>($idx)?,)+))
            }
        }
    };
}

scan_tuple!(1 => A: 0);
scan_tuple!(2 => A: 0, B: 1);
scan_tuple!(3 => A: 0, B: 1, C: 2);
scan_tuple!(4 => A: 0, B: 1, C: 2, D: 3);
scan_tuple!(5 => A: 0, B: 1, C: 2, D: 3, E: 4);
scan_tuple!(6 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
scan_tuple!(7 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
scan_tuple!(8 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, crate::Scan)]
    struct Pair(i64, String);

    #[derive(Debug, crate::Scan)]
    struct Named {
        id: i64,
        name: String,
        value: Option<String>,
    }

    fn user_row() -> Row {
        Row::new(
            vec!["id".to_string(), "name".to_string(), "value".to_string()],
            vec![Value::Int(1), Value::from("John"), Value::Null],
        )
    }

    #[test]
    fn test_scan_tuple_positionally() {
        let (id, name, value): (i64, String, Option<String>) = user_row().scans().unwrap();
        assert_eq!(id, 1);
        assert_eq!(name, "John");
        assert_eq!(value, None);
    }

    #[test]
    fn test_scan_column_count_mismatch() {
        let err = user_row().scans::<(i64, String)>().unwrap_err();
        match err {
            Error::Scan { expected, actual } => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_get_by_name() {
        let row = user_row();
        assert_eq!(row.get_by_name::<String>("name").unwrap(), "John");
        assert!(row.get_by_name::<String>("missing").is_err());

        let err = row.get::<i64>(1).unwrap_err();
        assert!(err.to_string().contains("column 1 (name)"));
    }

    #[test]
    fn test_row_to_json() {
        let json = user_row().to_json();
        assert_eq!(json["id"], serde_json::json!(1));
        assert_eq!(json["name"], serde_json::json!("John"));
        assert!(json["value"].is_null());
    }

    #[test]
    fn test_rows_scans_all() {
        let rows = Rows::new(vec![
            Row::new(vec!["id".into()], vec![Value::Int(1)]),
            Row::new(vec!["id".into()], vec![Value::Int(2)]),
        ]);
        let ids: Vec<(i64,)> = rows.scans().unwrap();
        assert_eq!(ids, vec![(1,), (2,)]);
        assert_eq!(rows.len(), 2);
        assert_eq!((&rows).into_iter().count(), 2);
    }

    #[test]
    fn test_derived_scan() {
        let row = Row::new(vec!["id".into(), "name".into()], vec![Value::Int(5), Value::from("John")]);
        assert_eq!(row.scans::<Pair>().unwrap(), Pair(5, "John".to_string()));

        let named: Named = user_row().scans().unwrap();
        assert_eq!(named.id, 1);
        assert_eq!(named.name, "John");
        assert_eq!(named.value, None);

        let err = user_row().scans::<Pair>().unwrap_err();
        assert!(matches!(err, Error::Scan { expected: 2, actual: 3 }));
    }
}
