use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::db::audit::HistoryFilter;
use crate::error::AppError;
use crate::models::ActionKind;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct HistoryParams {
    pub actor: Option<String>,
    pub module: Option<String>,
    pub action: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn history(
    State(state): State<SharedState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let action = params
        .action
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(str::parse::<ActionKind>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);

    let filter = HistoryFilter {
        actor_id: params.actor.filter(|a| !a.is_empty()),
        module: params.module.filter(|m| !m.is_empty()),
        action,
        limit: per_page,
        offset: (page - 1).saturating_mul(per_page),
    };

    let entries = state.audit.history(&filter).await?;

    Ok(Json(serde_json::json!({
        "entries": entries,
        "page": page,
        "per_page": per_page,
    })))
}
