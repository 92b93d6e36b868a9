use std::sync::Arc;

use crate::audit::AuditWriter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub audit: AuditWriter,
}
