//! Shorthands for the actions the clinic screens record.
//!
//! All of them are fire-and-forget: they return once the write has finished or
//! its failure has been logged.

use serde_json::Value;

use crate::audit::AuditWriter;
use crate::models::{ActionKind, AuditEntry};

pub const AUTH_MODULE: &str = "auth";

fn serialize(state: Option<&Value>) -> Option<String> {
    state.map(Value::to_string)
}

impl AuditWriter {
    pub async fn record_login(&self, actor_id: &str, display_name: &str) {
        self.record(AuditEntry::new(
            actor_id,
            ActionKind::Login,
            AUTH_MODULE,
            format!("Usuario {display_name} inició sesión"),
        ))
        .await;
    }

    pub async fn record_logout(&self, actor_id: &str, display_name: &str) {
        self.record(AuditEntry::new(
            actor_id,
            ActionKind::Logout,
            AUTH_MODULE,
            format!("Usuario {display_name} cerró sesión"),
        ))
        .await;
    }

    pub async fn record_create(
        &self,
        actor_id: &str,
        module: &str,
        description: &str,
        new_state: Option<&Value>,
    ) {
        let entry = AuditEntry::new(actor_id, ActionKind::Create, module, description)
            .with_new_state(serialize(new_state));
        self.record(entry).await;
    }

    pub async fn record_update(
        &self,
        actor_id: &str,
        module: &str,
        description: &str,
        previous_state: Option<&Value>,
        new_state: Option<&Value>,
    ) {
        let entry = AuditEntry::new(actor_id, ActionKind::Update, module, description)
            .with_previous_state(serialize(previous_state))
            .with_new_state(serialize(new_state));
        self.record(entry).await;
    }

    pub async fn record_delete(
        &self,
        actor_id: &str,
        module: &str,
        description: &str,
        previous_state: Option<&Value>,
    ) {
        let entry = AuditEntry::new(actor_id, ActionKind::Delete, module, description)
            .with_previous_state(serialize(previous_state));
        self.record(entry).await;
    }

    pub async fn record_view(&self, actor_id: &str, module: &str, description: &str) {
        self.record(AuditEntry::new(actor_id, ActionKind::View, module, description))
            .await;
    }
}
