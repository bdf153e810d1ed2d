//! Database gateway: caller-supplied SQL in, plain rows out.
//!
//! Both backends take `?` placeholders and understand backtick-quoted
//! identifiers, so the same statements run against MySQL and SQLite.
//! Every statement commits on its own.

mod mysql;
pub mod schema;
mod sqlite;

pub use mysql::MysqlGateway;
pub use sqlite::SqliteGateway;

use crate::config::{Backend, DbConfig};
use crate::error::Result;
use std::sync::Arc;

/// Build a `[Value; N]` parameter array from anything convertible into [`Value`].
#[macro_export]
macro_rules! values {
    ($($v:expr),* $(,)?) => {
        [$($crate::gateway::Value::from($v)),*]
    };
}

/// A bound parameter or a fetched cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i64)
            }
        })*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One fetched row with its column names.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<Vec<String>>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index_of(name).map(|idx| &self.values[idx])
    }

    pub fn value_at(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Cell rendered as text; NULL and absent columns are `None`.
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get(name)
            .filter(|v| !v.is_null())
            .map(|v| v.to_string())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// What a keyed save did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Parameterized access to the world database.
pub trait Gateway {
    fn backend(&self) -> Backend;

    fn backend_name(&self) -> &'static str {
        match self.backend() {
            Backend::Mysql => "mysql",
            Backend::Sqlite => "sqlite",
        }
    }

    fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Run a statement, returning the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    fn fetch_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.fetch_all(sql, params)?.into_iter().next())
    }

    /// First column of the first row as an integer, 0 when there is none.
    fn fetch_count(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let count = self
            .fetch_one(sql, params)?
            .and_then(|row| row.value_at(0).and_then(Value::as_i64))
            .unwrap_or(0);
        Ok(count.max(0) as u64)
    }
}

/// Open the backend selected in the configuration.
pub fn connect(config: &DbConfig) -> Result<Box<dyn Gateway>> {
    match config.backend {
        Backend::Mysql => Ok(Box::new(MysqlGateway::connect(config)?)),
        Backend::Sqlite => Ok(Box::new(SqliteGateway::open(&config.sqlite_path)?)),
    }
}

/// `?,?,?` for `n` parameters.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(5u32), Value::Int(5));
        assert_eq!(Value::from(-100.0f32), Value::Float(-100.0));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::Text(" 42 ".into()).as_i64(), Some(42));
        assert_eq!(Value::Float(2.9).as_i64(), Some(2));
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn test_row_lookup_is_case_tolerant() {
        let row = Row::new(
            Arc::new(vec!["entry".into(), "Title".into()]),
            vec![Value::Int(7), Value::Text("Hello".into())],
        );
        assert_eq!(row.get_i64("entry"), Some(7));
        assert_eq!(row.get_string("title").as_deref(), Some("Hello"));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_values_macro_and_placeholders() {
        let params = values![1, "two", 3.0];
        assert_eq!(params.len(), 3);
        assert_eq!(params[1], Value::Text("two".into()));
        assert_eq!(placeholders(3), "?,?,?");
    }
}
