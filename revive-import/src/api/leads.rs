//! Lead listing, the page users land on after an import

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::{self, LeadRow},
    error::{ApiError, ApiResult},
    AppState,
};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

/// GET /api/leads query
#[derive(Debug, Deserialize)]
pub struct LeadsQuery {
    pub owner_id: String,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/leads?owner_id=&status=&limit=
pub async fn list_leads(
    State(state): State<AppState>,
    Query(query): Query<LeadsQuery>,
) -> ApiResult<Json<Vec<LeadRow>>> {
    if query.owner_id.trim().is_empty() {
        return Err(ApiError::BadRequest("owner_id is required".to_string()));
    }
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let leads = db::list_leads(&state.db, &query.owner_id, query.status.as_deref(), limit).await?;
    Ok(Json(leads))
}

pub fn lead_routes() -> Router<AppState> {
    Router::new().route("/api/leads", get(list_leads))
}
