//! Parameter and row values exchanged with a backend

use crate::error::{DbError, DbResult};

/// A single SQL value, used both for bound parameters and result columns
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Interpret as a boolean.
    ///
    /// MySQL has no boolean type on the wire; `BOOLEAN` columns come back as
    /// integers (binary protocol) or `"0"`/`"1"` (text protocol).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            SqlValue::Int(i) => Some(*i != 0),
            SqlValue::UInt(u) => Some(*u != 0),
            SqlValue::Text(s) => match s.as_str() {
                "0" => Some(false),
                "1" => Some(true),
                _ => None,
            },
            _ => None,
        }
    }

    /// Borrow as text, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret as a signed integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            SqlValue::UInt(u) => i64::try_from(*u).ok(),
            SqlValue::Bool(b) => Some(i64::from(*b)),
            SqlValue::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    fn type_name(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(b) => format!("bool {b}"),
            SqlValue::Int(i) => format!("int {i}"),
            SqlValue::UInt(u) => format!("uint {u}"),
            SqlValue::Double(d) => format!("double {d}"),
            SqlValue::Text(s) => format!("text '{s}'"),
            SqlValue::Bytes(b) => format!("{} bytes", b.len()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        SqlValue::Bool(b)
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        SqlValue::Int(i)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// One result row, columns in select-list order
pub type Row = Vec<SqlValue>;

fn column(row: &Row, idx: usize) -> DbResult<&SqlValue> {
    row.get(idx).ok_or(DbError::MissingColumn(idx))
}

/// Read a non-null text column
pub fn get_string(row: &Row, idx: usize) -> DbResult<String> {
    let value = column(row, idx)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DbError::TypeMismatch {
            column: idx,
            expected: "text",
            found: value.type_name(),
        })
}

/// Read a nullable text column
pub fn get_opt_string(row: &Row, idx: usize) -> DbResult<Option<String>> {
    if column(row, idx)?.is_null() {
        return Ok(None);
    }
    get_string(row, idx).map(Some)
}

/// Read a non-null boolean column
pub fn get_bool(row: &Row, idx: usize) -> DbResult<bool> {
    let value = column(row, idx)?;
    value.as_bool().ok_or_else(|| DbError::TypeMismatch {
        column: idx,
        expected: "boolean",
        found: value.type_name(),
    })
}

/// Read a non-null integer column
pub fn get_i64(row: &Row, idx: usize) -> DbResult<i64> {
    let value = column(row, idx)?;
    value.as_i64().ok_or_else(|| DbError::TypeMismatch {
        column: idx,
        expected: "integer",
        found: value.type_name(),
    })
}

/// Outcome of a statement that returns no rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<u64>,
}
