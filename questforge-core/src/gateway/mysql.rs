use super::{Gateway, Row, Value};
use crate::config::{Backend, DbConfig};
use crate::error::{QuestforgeError, Result};
use mysql_async::prelude::*;
use mysql_async::{Opts, OptsBuilder, Params, Pool, PoolConstraints, PoolOpts};
use std::sync::Arc;
use tracing::{debug, info, warn};

fn to_mysql(value: &Value) -> mysql_async::Value {
    match value {
        Value::Null => mysql_async::Value::NULL,
        Value::Int(i) => mysql_async::Value::Int(*i),
        Value::Float(f) => mysql_async::Value::Double(*f),
        Value::Text(s) => mysql_async::Value::Bytes(s.as_bytes().to_vec()),
    }
}

fn from_mysql(value: mysql_async::Value) -> Value {
    match value {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Int(i) => Value::Int(i),
        mysql_async::Value::UInt(u) => i64::try_from(u)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(u.to_string())),
        // FLOAT columns: keep the shortest decimal form instead of widened binary noise
        mysql_async::Value::Float(f) => Value::Float(f.to_string().parse().unwrap_or(f as f64)),
        mysql_async::Value::Double(d) => Value::Float(d),
        mysql_async::Value::Bytes(bytes) => Value::Text(String::from_utf8_lossy(&bytes).into_owned()),
        mysql_async::Value::Date(year, month, day, hour, min, sec, _) => Value::Text(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            year, month, day, hour, min, sec
        )),
        mysql_async::Value::Time(negative, days, hours, mins, secs, _) => Value::Text(format!(
            "{}{:02}:{:02}:{:02}",
            if negative { "-" } else { "" },
            days * 24 + u32::from(hours),
            mins,
            secs
        )),
    }
}

fn to_params(params: &[Value]) -> Params {
    if params.is_empty() {
        Params::Empty
    } else {
        Params::Positional(params.iter().map(to_mysql).collect())
    }
}

/// MySQL/MariaDB world database.
///
/// mysql_async needs a tokio context for its pool, so the gateway owns a small
/// runtime and blocks on it for every call.
pub struct MysqlGateway {
    pool: Pool,
    runtime: tokio::runtime::Runtime,
}

impl MysqlGateway {
    /// Connect and verify credentials. Failures are reported once, never retried.
    pub fn connect(config: &DbConfig) -> Result<Self> {
        info!(
            "Connecting to MySQL {}@{}:{}/{}",
            config.user, config.host, config.port, config.database
        );

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("questforge-mysql")
            .build()
            .map_err(|e| QuestforgeError::Connection(format!("Failed to start MySQL runtime: {}", e)))?;

        let constraints = PoolConstraints::new(1, 1).ok_or_else(|| {
            QuestforgeError::Connection("Failed to configure MySQL pool constraints".to_string())
        })?;
        let pool_opts = PoolOpts::default()
            .with_constraints(constraints)
            .with_reset_connection(false);

        let opts: Opts = OptsBuilder::from_opts(Opts::default())
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port)
            .db_name(Some(config.database.clone()))
            .user(Some(config.user.clone()))
            .pass(Some(config.password.clone()))
            .init(vec![format!("SET NAMES {}", config.charset)])
            .pool_opts(pool_opts)
            .into();

        let pool = runtime
            .block_on(async {
                let pool = Pool::new(opts);
                let conn = pool.get_conn().await?;
                drop(conn);
                Ok::<Pool, mysql_async::Error>(pool)
            })
            .map_err(|e| {
                QuestforgeError::Connection(format!(
                    "Failed to connect to MySQL at {}:{}: {}",
                    config.host, config.port, e
                ))
            })?;

        Ok(Self { pool, runtime })
    }
}

impl Gateway for MysqlGateway {
    fn backend(&self) -> Backend {
        Backend::Mysql
    }

    fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        debug!(sql = %sql, "mysql fetch");
        let params = to_params(params);
        let mysql_rows: Vec<mysql_async::Row> = self.runtime.block_on(async {
            let mut conn = self.pool.get_conn().await?;
            conn.exec(sql, params).await
        })?;

        let Some(first) = mysql_rows.first() else {
            return Ok(Vec::new());
        };
        let columns: Arc<Vec<String>> = Arc::new(
            first
                .columns_ref()
                .iter()
                .map(|col| col.name_str().to_string())
                .collect(),
        );

        let rows = mysql_rows
            .into_iter()
            .map(|row| {
                let values = (0..columns.len())
                    .map(|idx| {
                        let raw: mysql_async::Value =
                            row.get(idx).unwrap_or(mysql_async::Value::NULL);
                        from_mysql(raw)
                    })
                    .collect();
                Row::new(Arc::clone(&columns), values)
            })
            .collect();
        Ok(rows)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        debug!(sql = %sql, "mysql execute");
        let params = to_params(params);
        let affected = self.runtime.block_on(async {
            let mut conn = self.pool.get_conn().await?;
            conn.exec_drop(sql, params).await?;
            Ok::<u64, mysql_async::Error>(conn.affected_rows())
        })?;
        Ok(affected)
    }
}

impl Drop for MysqlGateway {
    fn drop(&mut self) {
        let pool = self.pool.clone();
        if let Err(e) = self.runtime.block_on(pool.disconnect()) {
            warn!("MySQL pool did not disconnect cleanly: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_mapping() {
        assert_eq!(from_mysql(mysql_async::Value::NULL), Value::Null);
        assert_eq!(from_mysql(mysql_async::Value::UInt(7)), Value::Int(7));
        assert_eq!(from_mysql(mysql_async::Value::Float(33.3)), Value::Float(33.3));
        assert_eq!(
            from_mysql(mysql_async::Value::Bytes(b"Kobold Candle".to_vec())),
            Value::Text("Kobold Candle".into())
        );
        assert_eq!(to_mysql(&Value::Int(-100)), mysql_async::Value::Int(-100));
        assert!(matches!(to_params(&[]), Params::Empty));
    }

    #[test]
    fn test_unreachable_server_is_connection_error() {
        let config = DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..DbConfig::default()
        };
        assert!(matches!(
            MysqlGateway::connect(&config),
            Err(QuestforgeError::Connection(_))
        ));
    }
}
