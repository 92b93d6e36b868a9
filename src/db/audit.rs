use crate::audit::schema::{AuditTable, SchemaInspector};
use crate::audit::statement::{ACTION_COLUMN, ACTOR_COLUMN, MODULE_COLUMN};
use crate::db::{GatewayError, Param, QueryGateway, Row, Statement};
use crate::models::ActionKind;

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub actor_id: Option<String>,
    pub module: Option<String>,
    pub action: Option<ActionKind>,
    pub limit: i64,
    pub offset: i64,
}

pub fn list_statement(table: &AuditTable, filter: &HistoryFilter, order_by_id: bool) -> Statement {
    let mut conditions = Vec::new();
    let mut params: Vec<Param> = Vec::new();

    if let Some(actor_id) = &filter.actor_id {
        conditions.push(format!("`{ACTOR_COLUMN}` = ?"));
        params.push(actor_id.clone().into());
    }
    if let Some(module) = &filter.module {
        conditions.push(format!("`{MODULE_COLUMN}` = ?"));
        params.push(module.clone().into());
    }
    if let Some(action) = filter.action {
        conditions.push(format!("`{ACTION_COLUMN}` = ?"));
        params.push(action.as_str().into());
    }

    let mut sql = format!("SELECT * FROM {}", table.quoted());
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    if order_by_id {
        sql.push_str(" ORDER BY `id` DESC");
    }
    sql.push_str(" LIMIT ? OFFSET ?");
    params.push(filter.limit.into());
    params.push(filter.offset.into());

    let mut statement = Statement::query(sql);
    statement.params = params;
    statement
}

/// Entries matching `filter`, newest first when the table has an `id` column.
pub async fn list(
    gateway: &QueryGateway,
    table: &AuditTable,
    filter: &HistoryFilter,
) -> Result<Vec<Row>, GatewayError> {
    let available = gateway.available_columns(table).await?;
    let statement = list_statement(table, filter, available.contains("id"));
    Ok(gateway.execute(&statement).await?.into_rows())
}
