//! Best-effort audit trail.
//!
//! Writes adapt to whatever columns the audit table has at the moment of the
//! call, and failures stop at [`AuditWriter`]: the business operation that
//! triggered the write never sees them.

pub mod recorder;
pub mod schema;
pub mod statement;
pub mod writer;

use crate::db::GatewayError;

pub use schema::{AuditTable, AvailableColumns, SchemaInspector};
pub use writer::AuditWriter;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to read audit table columns: {0}")]
    Schema(#[source] GatewayError),
    #[error("failed to write audit entry: {0}")]
    Write(#[source] GatewayError),
    #[error("failed to read audit history: {0}")]
    History(#[source] GatewayError),
    #[error("audit table '{0}' has no writable columns")]
    NoWritableColumns(String),
    #[error("invalid audit table name '{0}'")]
    InvalidTable(String),
}
