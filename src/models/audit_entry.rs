use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of a recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Login,
    Logout,
    Create,
    Update,
    Delete,
    View,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Login => "login",
            ActionKind::Logout => "logout",
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
            ActionKind::View => "view",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(ActionKind::Login),
            "logout" => Ok(ActionKind::Logout),
            "create" => Ok(ActionKind::Create),
            "update" => Ok(ActionKind::Update),
            "delete" => Ok(ActionKind::Delete),
            "view" => Ok(ActionKind::View),
            other => Err(format!("unknown action kind '{other}'")),
        }
    }
}

/// One user action destined for the audit trail.
///
/// Built inside the business operation and consumed by a single write.
/// `previous_state` is only meaningful for updates and deletes, `new_state`
/// only for creates and updates.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub actor_id: String,
    pub action: ActionKind,
    pub module: String,
    pub description: String,
    pub previous_state: Option<String>,
    pub new_state: Option<String>,
}

impl AuditEntry {
    pub fn new(
        actor_id: impl Into<String>,
        action: ActionKind,
        module: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            action,
            module: module.into(),
            description: description.into(),
            previous_state: None,
            new_state: None,
        }
    }

    pub fn with_previous_state(mut self, state: Option<String>) -> Self {
        self.previous_state = state;
        self
    }

    pub fn with_new_state(mut self, state: Option<String>) -> Self {
        self.new_state = state;
        self
    }
}
