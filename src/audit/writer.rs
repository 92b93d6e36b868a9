use crate::audit::AuditError;
use crate::audit::schema::{AuditTable, SchemaInspector};
use crate::audit::statement::build_insert;
use crate::db::{self, QueryGateway, Row};
use crate::db::audit::HistoryFilter;
use crate::models::AuditEntry;

#[derive(Clone)]
pub struct AuditWriter {
    gateway: QueryGateway,
    table: AuditTable,
}

impl AuditWriter {
    pub fn new(gateway: QueryGateway, table: AuditTable) -> Self {
        Self { gateway, table }
    }

    /// Persist an entry, reporting what went wrong.
    ///
    /// The column set is re-read on every call; nothing is cached between writes.
    pub async fn write(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let available = self
            .gateway
            .available_columns(&self.table)
            .await
            .map_err(AuditError::Schema)?;

        let statement = build_insert(&self.table, &available, entry)?;

        self.gateway
            .execute(&statement)
            .await
            .map_err(AuditError::Write)?;

        tracing::debug!(
            actor = %entry.actor_id,
            action = %entry.action,
            module = %entry.module,
            columns = statement.params.len(),
            "Audit entry recorded"
        );
        Ok(())
    }

    /// Persist an entry without ever failing the caller. Errors are logged.
    pub async fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.write(&entry).await {
            tracing::error!(
                actor = %entry.actor_id,
                action = %entry.action,
                module = %entry.module,
                "Failed to log audit event: {e}"
            );
        }
    }

    /// Recorded entries, newest first.
    pub async fn history(&self, filter: &HistoryFilter) -> Result<Vec<Row>, AuditError> {
        db::audit::list(&self.gateway, &self.table, filter)
            .await
            .map_err(AuditError::History)
    }
}
