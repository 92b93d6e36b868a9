#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use clinic_audit::audit::{AuditTable, AuditWriter};
use clinic_audit::db::{
    Connection, ConnectionProvider, GatewayError, QueryGateway, QueryOutcome, RetryPolicy, Row,
    Statement,
};

pub const BASIC_COLUMNS: [&str; 4] = ["usuario_id", "accion", "modulo", "descripcion"];
pub const ALL_COLUMNS: [&str; 6] = [
    "usuario_id",
    "accion",
    "modulo",
    "descripcion",
    "datos_anteriores",
    "datos_nuevos",
];

/// What the scripted database answers to the next statement.
pub enum Step {
    Rows(Vec<Row>),
    Done,
    /// Connection reset by peer.
    Transient,
    /// A failure that is not worth retrying.
    Fatal,
    /// The statement outlived the query timeout.
    QueryTimeout,
}

#[derive(Default)]
struct Script {
    steps: VecDeque<Step>,
    opens: usize,
    closes: usize,
    executed: Vec<Statement>,
}

/// A connection provider that replays scripted answers and counts connections.
#[derive(Clone, Default)]
pub struct ScriptedDb {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDb {
    pub fn new(steps: Vec<Step>) -> Self {
        let db = Self::default();
        db.script.lock().unwrap().steps = steps.into();
        db
    }

    pub fn opens(&self) -> usize {
        self.script.lock().unwrap().opens
    }

    pub fn closes(&self) -> usize {
        self.script.lock().unwrap().closes
    }

    pub fn executed(&self) -> Vec<Statement> {
        self.script.lock().unwrap().executed.clone()
    }

    pub fn inserts(&self) -> Vec<Statement> {
        self.executed()
            .into_iter()
            .filter(|s| s.sql.starts_with("INSERT"))
            .collect()
    }

    pub fn gateway(&self, max_attempts: u32) -> QueryGateway {
        QueryGateway::new(
            Arc::new(self.clone()),
            RetryPolicy {
                max_attempts,
                delay: Duration::from_millis(1),
            },
        )
    }

    pub fn writer(&self) -> AuditWriter {
        AuditWriter::new(self.gateway(2), AuditTable::new("auditoria").unwrap())
    }
}

#[async_trait]
impl ConnectionProvider for ScriptedDb {
    async fn open(&self) -> Result<Box<dyn Connection>, GatewayError> {
        self.script.lock().unwrap().opens += 1;
        Ok(Box::new(ScriptedConnection {
            script: self.script.clone(),
        }))
    }
}

struct ScriptedConnection {
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn run(&mut self, statement: &Statement) -> Result<QueryOutcome, GatewayError> {
        let mut script = self.script.lock().unwrap();
        script.executed.push(statement.clone());

        match script.steps.pop_front().unwrap_or(Step::Done) {
            Step::Rows(rows) => Ok(QueryOutcome::Rows(rows)),
            Step::Done => Ok(QueryOutcome::Done {
                rows_affected: 1,
                last_insert_id: Some(1),
            }),
            Step::Transient => Err(transient_error()),
            Step::Fatal => Err(fatal_error()),
            Step::QueryTimeout => Err(GatewayError::QueryTimeout(Duration::from_secs(60))),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), GatewayError> {
        self.script.lock().unwrap().closes += 1;
        Ok(())
    }
}

pub fn transient_error() -> GatewayError {
    GatewayError::Sqlx(sqlx::Error::Io(io::Error::new(
        io::ErrorKind::ConnectionReset,
        "connection reset by peer",
    )))
}

pub fn fatal_error() -> GatewayError {
    GatewayError::Sqlx(sqlx::Error::Protocol(
        "Duplicate entry '1' for key 'PRIMARY'".to_string(),
    ))
}

/// Rows as returned by the column introspection query.
pub fn schema(columns: &[&str]) -> Step {
    Step::Rows(
        columns
            .iter()
            .map(|c| row(json!({ "column_name": c })))
            .collect(),
    )
}

pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
