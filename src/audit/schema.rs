use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::audit::AuditError;
use crate::db::{GatewayError, QueryGateway, Statement};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]{0,63}$").unwrap());

/// Name of the table audit entries are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTable(String);

impl AuditTable {
    pub fn new(name: &str) -> Result<Self, AuditError> {
        if !IDENTIFIER.is_match(name) {
            return Err(AuditError::InvalidTable(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Backtick-quoted form for use inside SQL.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl fmt::Display for AuditTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Columns currently present on a table. Matching ignores case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailableColumns(HashSet<String>);

impl AvailableColumns {
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(&column.to_ascii_lowercase())
    }
}

impl<S: AsRef<str>> FromIterator<S> for AvailableColumns {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|c| c.as_ref().to_ascii_lowercase())
                .collect(),
        )
    }
}

#[async_trait]
pub trait SchemaInspector: Send + Sync {
    async fn available_columns(&self, table: &AuditTable)
    -> Result<AvailableColumns, GatewayError>;
}

pub fn columns_statement(table: &AuditTable) -> Statement {
    Statement::query(
        "SELECT CAST(COLUMN_NAME AS CHAR) AS column_name
         FROM information_schema.COLUMNS
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
         ORDER BY ORDINAL_POSITION",
    )
    .bind(table.name())
}

#[async_trait]
impl SchemaInspector for QueryGateway {
    async fn available_columns(
        &self,
        table: &AuditTable,
    ) -> Result<AvailableColumns, GatewayError> {
        let rows = self.execute(&columns_statement(table)).await?.into_rows();

        Ok(rows
            .iter()
            .filter_map(|row| row.get("column_name").and_then(|v| v.as_str()))
            .collect())
    }
}
