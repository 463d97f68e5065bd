//! Import session API handlers
//!
//! POST /import/sessions, GET/DELETE /import/sessions/{id},
//! POST /import/sessions/{id}/upload|import|cancel, GET /import/template

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{ImportSession, ParseSummary},
    services::{LEADS_TEMPLATE, TEMPLATE_FILE_NAME},
    AppState,
};

/// POST /import/sessions request
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// User the imported leads will belong to
    pub owner_id: String,
}

/// POST /import/sessions/{id}/upload request
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Full file text
    pub content: String,
}

/// Session as shown to the UI
#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: ImportSession,
    pub summary: ParseSummary,
    /// Progress percentage (0.0-100.0), absent before the first import
    pub percentage: Option<f32>,
}

impl From<ImportSession> for SessionView {
    fn from(session: ImportSession) -> Self {
        Self {
            summary: session.parse_summary(),
            percentage: session.progress.map(|p| p.percentage()),
            session,
        }
    }
}

/// POST /import/sessions
pub async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let Json(request) = payload?;
    let owner_id = request.owner_id.trim();
    if owner_id.is_empty() {
        return Err(ApiError::BadRequest("owner_id is required".to_string()));
    }

    let session = state.sessions.create_session(owner_id).await;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// GET /import/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let session = state.sessions.snapshot(session_id).await?;
    tracing::debug!(session_id = %session_id, state = %session.state, "Status query");
    Ok(Json(session.into()))
}

/// POST /import/sessions/{id}/upload
///
/// A file that fails to parse still returns 200 with the session in
/// `PARSE_ERROR`. A non-CSV file, a busy session or a body over
/// `max_upload_bytes` is an HTTP error.
pub async fn upload_file(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> ApiResult<Json<SessionView>> {
    let Json(request) = payload?;
    let session = state
        .sessions
        .upload(
            session_id,
            &request.file_name,
            request.content_type.as_deref(),
            &request.content,
        )
        .await?;
    Ok(Json(session.into()))
}

/// POST /import/sessions/{id}/import
///
/// Returns 202 Accepted once the session is `IMPORTING`; progress follows on
/// /import/events and in the session view.
pub async fn start_import(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let session = state.sessions.start_import(session_id).await?;
    Ok((StatusCode::ACCEPTED, Json(session.into())))
}

/// POST /import/sessions/{id}/cancel
pub async fn cancel_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let session = state.sessions.reset(session_id).await?;
    Ok(Json(session.into()))
}

/// DELETE /import/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.sessions.remove(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /import/template
pub async fn download_template() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", TEMPLATE_FILE_NAME),
            ),
        ],
        LEADS_TEMPLATE,
    )
}

/// Build import session routes; uploads may be up to `max_upload_bytes`
pub fn import_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/import/sessions", post(create_session))
        .route("/import/sessions/:id", get(get_session).delete(delete_session))
        .route(
            "/import/sessions/:id/upload",
            post(upload_file).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/import/sessions/:id/import", post(start_import))
        .route("/import/sessions/:id/cancel", post(cancel_session))
        .route("/import/template", get(download_template))
}
