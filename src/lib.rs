pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::audit::{AuditError, AuditTable, AuditWriter};
use crate::config::AuditConfig;
use crate::db::{ConnectionProvider, QueryGateway, RetryPolicy};
use crate::state::{AppState, SharedState};

/// Wire a connection provider into a gateway and an audit writer.
pub fn build_writer(
    provider: Arc<dyn ConnectionProvider>,
    config: &AuditConfig,
) -> Result<AuditWriter, AuditError> {
    let table = AuditTable::new(&config.table)?;
    let gateway = QueryGateway::new(
        provider,
        RetryPolicy {
            max_attempts: config.max_attempts,
            delay: config.retry_delay,
        },
    );
    Ok(AuditWriter::new(gateway, table))
}

pub fn build_app(audit: AuditWriter) -> Router {
    let state: SharedState = Arc::new(AppState { audit });

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
