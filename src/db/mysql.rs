use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::mysql::{
    MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode,
};
use sqlx::pool::PoolConnection;
use sqlx::{Column, ConnectOptions, MySql, Row as _};

use crate::config::{DatabaseConfig, SslMode};
use crate::db::connector::{Connection, ConnectionProvider};
use crate::db::gateway::GatewayError;
use crate::db::statement::{Param, QueryOutcome, Row, Statement};

pub fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database)
        .charset(&config.charset)
        .timezone(Some(config.timezone.clone()))
        .ssl_mode(match config.tls.mode {
            SslMode::Disabled => MySqlSslMode::Disabled,
            SslMode::Preferred => MySqlSslMode::Preferred,
            SslMode::Required => MySqlSslMode::Required,
            SslMode::VerifyCa => MySqlSslMode::VerifyCa,
            SslMode::VerifyIdentity => MySqlSslMode::VerifyIdentity,
        });

    if let Some(ca) = &config.tls.ca {
        options = options.ssl_ca(ca);
    }
    if let Some(cert) = &config.tls.cert {
        options = options.ssl_client_cert(cert);
    }
    if let Some(key) = &config.tls.key {
        options = options.ssl_client_key(key);
    }

    options
}

/// Opens a fresh connection for every attempt.
pub struct DirectConnector {
    options: MySqlConnectOptions,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl DirectConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            options: connect_options(config),
            connect_timeout: config.acquire_timeout,
            query_timeout: config.query_timeout,
        }
    }
}

#[async_trait]
impl ConnectionProvider for DirectConnector {
    async fn open(&self) -> Result<Box<dyn Connection>, GatewayError> {
        let conn = tokio::time::timeout(self.connect_timeout, self.options.connect())
            .await
            .map_err(|_| GatewayError::ConnectTimeout(self.connect_timeout))??;

        Ok(Box::new(DirectConnection {
            conn,
            query_timeout: self.query_timeout,
        }))
    }
}

struct DirectConnection {
    conn: MySqlConnection,
    query_timeout: Duration,
}

#[async_trait]
impl Connection for DirectConnection {
    async fn run(&mut self, statement: &Statement) -> Result<QueryOutcome, GatewayError> {
        run_statement(&mut self.conn, statement, self.query_timeout).await
    }

    async fn close(self: Box<Self>) -> Result<(), GatewayError> {
        let DirectConnection { conn, .. } = *self;
        sqlx::Connection::close(conn).await?;
        Ok(())
    }
}

/// Borrows connections from a bounded pool and hands them back on close.
pub struct PooledConnector {
    pool: MySqlPool,
    query_timeout: Duration,
    /// Acquisitions allowed to be outstanding at once; `None` means unbounded.
    max_outstanding: Option<usize>,
    outstanding: Arc<AtomicUsize>,
}

impl PooledConnector {
    /// Builds the pool lazily; no connection is made until the first acquire.
    pub fn new(config: &DatabaseConfig) -> Self {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.connection_limit)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_lazy_with(connect_options(config));

        let max_outstanding = (config.queue_limit > 0)
            .then(|| config.connection_limit as usize + config.queue_limit);

        Self {
            pool,
            query_timeout: config.query_timeout,
            max_outstanding,
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn shutdown(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ConnectionProvider for PooledConnector {
    async fn open(&self) -> Result<Box<dyn Connection>, GatewayError> {
        let previous = self.outstanding.fetch_add(1, Ordering::SeqCst);
        let slot = OutstandingSlot(self.outstanding.clone());

        if let Some(max) = self.max_outstanding {
            if previous >= max {
                return Err(GatewayError::QueueLimit);
            }
        }

        let conn = self.pool.acquire().await?;

        Ok(Box::new(PooledConnection {
            conn,
            query_timeout: self.query_timeout,
            _slot: slot,
        }))
    }
}

/// Releases one outstanding acquisition when dropped.
struct OutstandingSlot(Arc<AtomicUsize>);

impl Drop for OutstandingSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct PooledConnection {
    conn: PoolConnection<MySql>,
    query_timeout: Duration,
    _slot: OutstandingSlot,
}

#[async_trait]
impl Connection for PooledConnection {
    async fn run(&mut self, statement: &Statement) -> Result<QueryOutcome, GatewayError> {
        run_statement(&mut self.conn, statement, self.query_timeout).await
    }

    async fn close(self: Box<Self>) -> Result<(), GatewayError> {
        // Dropping a PoolConnection returns it to the pool.
        drop(self);
        Ok(())
    }
}

async fn run_statement(
    conn: &mut MySqlConnection,
    statement: &Statement,
    timeout: Duration,
) -> Result<QueryOutcome, GatewayError> {
    let mut query = sqlx::query(&statement.sql);
    for param in &statement.params {
        query = match param {
            Param::Text(value) => query.bind(value.as_str()),
            Param::Int(value) => query.bind(*value),
            Param::Null => query.bind(None::<String>),
        };
    }

    let outcome = if statement.returns_rows {
        let rows = tokio::time::timeout(timeout, query.fetch_all(&mut *conn))
            .await
            .map_err(|_| GatewayError::QueryTimeout(timeout))??;
        QueryOutcome::Rows(rows.iter().map(decode_row).collect())
    } else {
        let result = tokio::time::timeout(timeout, query.execute(&mut *conn))
            .await
            .map_err(|_| GatewayError::QueryTimeout(timeout))??;
        QueryOutcome::Done {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_id()).filter(|id| *id != 0),
        }
    };

    Ok(outcome)
}

fn decode_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), decode_value(row, column.ordinal())))
        .collect()
}

/// Decode a column into JSON, trying the common MySQL shapes in turn.
fn decode_value(row: &MySqlRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        return v.map(|t| Value::String(t.to_rfc3339())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return v.map(|t| Value::String(t.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return v.map(|d| Value::String(d.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Value>, _>(idx) {
        return v.unwrap_or(Value::Null);
    }
    Value::Null
}
