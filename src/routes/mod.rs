pub mod audit;

use axum::Router;
use axum::routing::get;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Audit history
        .route("/api/v1/audit", get(audit::history))
}
