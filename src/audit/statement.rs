use crate::audit::AuditError;
use crate::audit::schema::{AuditTable, AvailableColumns};
use crate::db::{Param, Statement};
use crate::models::AuditEntry;

pub const ACTOR_COLUMN: &str = "usuario_id";
pub const ACTION_COLUMN: &str = "accion";
pub const MODULE_COLUMN: &str = "modulo";
pub const DESCRIPTION_COLUMN: &str = "descripcion";
pub const PREVIOUS_STATE_COLUMN: &str = "datos_anteriores";
pub const NEW_STATE_COLUMN: &str = "datos_nuevos";

struct AuditColumn {
    name: &'static str,
    optional: bool,
    value: fn(&AuditEntry) -> Param,
}

/// Every column an entry can fill, in insertion order.
const COLUMNS: [AuditColumn; 6] = [
    AuditColumn {
        name: ACTOR_COLUMN,
        optional: false,
        value: |e| Param::from(e.actor_id.clone()),
    },
    AuditColumn {
        name: ACTION_COLUMN,
        optional: false,
        value: |e| Param::from(e.action.as_str()),
    },
    AuditColumn {
        name: MODULE_COLUMN,
        optional: false,
        value: |e| Param::from(e.module.clone()),
    },
    AuditColumn {
        name: DESCRIPTION_COLUMN,
        optional: false,
        value: |e| Param::from(e.description.clone()),
    },
    AuditColumn {
        name: PREVIOUS_STATE_COLUMN,
        optional: true,
        value: |e| Param::from(e.previous_state.clone()),
    },
    AuditColumn {
        name: NEW_STATE_COLUMN,
        optional: true,
        value: |e| Param::from(e.new_state.clone()),
    },
];

/// Build an INSERT over the columns that exist right now.
///
/// Columns missing from `available` are skipped. Present state columns are
/// always written, as NULL when the entry has no snapshot.
pub fn build_insert(
    table: &AuditTable,
    available: &AvailableColumns,
    entry: &AuditEntry,
) -> Result<Statement, AuditError> {
    let included: Vec<&AuditColumn> = COLUMNS
        .iter()
        .filter(|column| available.contains(column.name))
        .collect();

    if included.is_empty() {
        return Err(AuditError::NoWritableColumns(table.to_string()));
    }

    if included.iter().all(|column| column.optional) {
        tracing::warn!(
            table = %table,
            "Audit table has none of the basic columns, writing state columns only"
        );
    }

    let names = included
        .iter()
        .map(|column| format!("`{}`", column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; included.len()].join(", ");

    let mut statement = Statement::command(format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders})",
        table.quoted()
    ));
    statement.params = included.iter().map(|column| (column.value)(entry)).collect();

    Ok(statement)
}
