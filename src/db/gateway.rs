//! Query execution with bounded retry.
//!
//! Every attempt opens its own connection through the injected
//! [`ConnectionProvider`] and closes it before the attempt ends, whatever the
//! outcome. Only transient connection failures are retried, after a fixed delay.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use sqlx::mysql::MySqlDatabaseError;

use crate::db::connector::ConnectionProvider;
use crate::db::statement::{QueryOutcome, Statement};

/// MySQL server error: too many connections.
pub const ER_CON_COUNT_ERROR: u16 = 1040;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),
    /// The statement may already have been applied by the server.
    #[error("query timed out after {0:?}")]
    QueryTimeout(Duration),
    #[error("connection queue limit reached")]
    QueueLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    Fatal,
}

/// Decide whether a failure is worth another attempt.
///
/// Transient: connect timeouts, resets, lost connections and "too many
/// connections". A query timeout is fatal: the server may have committed the
/// statement, and running it again could duplicate the row.
/// Everything else (bad SQL, constraint violations, auth failures) is fatal.
pub fn classify_error(err: &GatewayError) -> ErrorClass {
    match err {
        GatewayError::ConnectTimeout(_) => ErrorClass::Transient,
        GatewayError::QueryTimeout(_) | GatewayError::QueueLimit => ErrorClass::Fatal,
        GatewayError::Sqlx(sqlx::Error::PoolTimedOut) => ErrorClass::Transient,
        GatewayError::Sqlx(sqlx::Error::Io(io)) => match io.kind() {
            ErrorKind::TimedOut
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => ErrorClass::Transient,
            _ => ErrorClass::Fatal,
        },
        GatewayError::Sqlx(sqlx::Error::Database(db_err)) => {
            match db_err.try_downcast_ref::<MySqlDatabaseError>() {
                Some(mysql) => classify_server_error(mysql.number()),
                None => ErrorClass::Fatal,
            }
        }
        GatewayError::Sqlx(_) => ErrorClass::Fatal,
    }
}

/// Classify a MySQL server error number. Lost connections never reach here:
/// sqlx reports them as I/O errors.
pub fn classify_server_error(number: u16) -> ErrorClass {
    match number {
        ER_CON_COUNT_ERROR => ErrorClass::Transient,
        _ => ErrorClass::Fatal,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts including the first one. Zero behaves as one.
    pub max_attempts: u32,
    /// Fixed pause before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(1),
        }
    }
}

#[derive(Clone)]
pub struct QueryGateway {
    provider: Arc<dyn ConnectionProvider>,
    policy: RetryPolicy,
}

impl QueryGateway {
    pub fn new(provider: Arc<dyn ConnectionProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// Run a statement with the gateway's default attempt budget.
    pub async fn execute(&self, statement: &Statement) -> Result<QueryOutcome, GatewayError> {
        self.execute_with_attempts(statement, self.policy.max_attempts)
            .await
    }

    pub async fn execute_with_attempts(
        &self,
        statement: &Statement,
        max_attempts: u32,
    ) -> Result<QueryOutcome, GatewayError> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let err = match self.attempt(statement).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) => err,
            };

            if classify_error(&err) == ErrorClass::Fatal || attempt >= max_attempts {
                return Err(err);
            }

            tracing::warn!(
                attempt,
                max_attempts,
                error = %err,
                "Transient database error, retrying in {:?}",
                self.policy.delay
            );
            tokio::time::sleep(self.policy.delay).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, statement: &Statement) -> Result<QueryOutcome, GatewayError> {
        let mut conn = self.provider.open().await?;
        let result = conn.run(statement).await;

        if let Err(e) = conn.close().await {
            tracing::warn!("Failed to close database connection: {e}");
        }

        result
    }
}
