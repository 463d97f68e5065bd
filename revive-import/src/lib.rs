//! revive-import library interface
//!
//! Lead file import service: parses uploaded CSV files, previews the
//! validated rows, and stores them in batches. Exposed as a library so the
//! integration tests can drive the router directly.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use revive_common::config::ImportConfig;
use revive_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::db::SqliteLeadStore;
use crate::services::SessionManager;

/// Name reported by `/health` and used for the config file
pub const MODULE_NAME: &str = "revive-import";

/// Capacity of the import event channel
pub const EVENT_BUS_CAPACITY: usize = 100;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Live import sessions
    pub sessions: SessionManager,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    pub environment: String,
}

impl AppState {
    /// State with leads stored in `db`
    pub fn new(db: SqlitePool, event_bus: EventBus, import: ImportConfig, environment: String) -> Self {
        let store = Arc::new(SqliteLeadStore::new(db.clone()));
        let sessions = SessionManager::new(store, event_bus.clone(), import);
        Self {
            db,
            event_bus,
            sessions,
            startup_time: Utc::now(),
            environment,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let max_upload_bytes = state.sessions.settings().max_upload_bytes;

    Router::new()
        .merge(api::import_routes(max_upload_bytes))
        .merge(api::lead_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .route("/import/events", get(api::import_event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
