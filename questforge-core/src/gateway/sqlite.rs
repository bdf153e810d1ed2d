use super::{Gateway, Row, Value, schema};
use crate::config::Backend;
use crate::error::{QuestforgeError, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params_from_iter;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use std::sync::Arc;
use tracing::debug;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Int(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    }
}

/// SQLite-backed world database, used as a local sandbox and in tests.
pub struct SqliteGateway {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteGateway {
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(QuestforgeError::Pool)?;
        debug!("Opened SQLite world database at {}", path.display());
        Ok(Self { pool })
    }

    /// Private in-memory database. One pooled connection, so every call sees the same data.
    pub fn in_memory() -> Result<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())
            .map_err(QuestforgeError::Pool)?;
        Ok(Self { pool })
    }

    pub fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(QuestforgeError::Pool)
    }

    /// Create the subset of the world schema the editor reads and writes.
    pub fn install_world_schema(&self) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        tx.execute_batch(&schema::world_schema_sql())?;
        tx.commit()?;
        Ok(())
    }
}

impl Gateway for SqliteGateway {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Arc<Vec<String>> =
            Arc::new(stmt.column_names().into_iter().map(String::from).collect());

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(from_sqlite(row.get_ref(idx)?));
            }
            out.push(Row::new(Arc::clone(&columns), values));
        }
        Ok(out)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let conn = self.connection()?;
        let affected = conn.execute(sql, params_from_iter(params.iter()))?;
        Ok(affected as u64)
    }
}
