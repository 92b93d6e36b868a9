use async_trait::async_trait;

use crate::db::gateway::GatewayError;
use crate::db::statement::{QueryOutcome, Statement};

/// A single open database connection.
#[async_trait]
pub trait Connection: Send {
    async fn run(&mut self, statement: &Statement) -> Result<QueryOutcome, GatewayError>;

    /// Release the connection. Called exactly once per opened connection.
    async fn close(self: Box<Self>) -> Result<(), GatewayError>;
}

/// Source of connections for the gateway, built at startup and injected.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Connection>, GatewayError>;
}
