//! Error types for revive-import
//!
//! Parse-time errors abort an upload, batch errors are counted, and only a
//! session in which every batch failed surfaces as [`ImportError::ImportFailed`].

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use revive_common::events::ImportProgress;
use serde_json::json;
use thiserror::Error;

use crate::models::SessionState;

/// Uploaded file does not have the shape required for a lead import
///
/// Messages are shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("CSV file is empty")]
    Empty,

    /// Required columns absent from the header, in required-column order
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Session-level import outcome errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// Import requested with zero valid records; no batch was created
    #[error("No valid leads to import")]
    NoValidRecords,

    /// Every batch failed, nothing was stored
    #[error("{message}")]
    ImportFailed {
        message: String,
        progress: ImportProgress,
    },
}

/// Failure reported by the storage collaborator for a whole batch
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Backend refused the batch (constraint, permission, ...)
    #[error("{0}")]
    Rejected(String),
}

/// Session state machine violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Import session not found: {0}")]
    NotFound(uuid::Uuid),

    /// Dropped or selected file is not a CSV file; state is unchanged
    #[error("Please upload a CSV file")]
    NotCsv { file_name: String },

    #[error("Cannot {action} while the import session is {state}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },

    #[error(transparent)]
    Import(#[from] ImportError),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g. upload while an import is running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request understood but refused by the import rules (422)
    #[error("{0}")]
    Unprocessable(String),

    /// Request body over the upload limit (413)
    #[error("{0}")]
    PayloadTooLarge(String),

    /// revive-common error
    #[error("Common error: {0}")]
    Common(#[from] revive_common::Error),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => ApiError::NotFound(err.to_string()),
            SessionError::NotCsv { .. } => ApiError::BadRequest(err.to_string()),
            SessionError::InvalidState { .. } => ApiError::Conflict(err.to_string()),
            SessionError::Import(_) => ApiError::Unprocessable(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Unprocessable(_) => (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
        };

        let message = match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unprocessable(msg)
            | ApiError::PayloadTooLarge(msg) => msg,
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_messages() {
        assert_eq!(FormatError::Empty.to_string(), "CSV file is empty");
        assert_eq!(
            FormatError::MissingColumns(vec!["last_name".into(), "email".into()]).to_string(),
            "Missing required columns: last_name, email"
        );
    }

    #[test]
    fn test_session_error_status_mapping() {
        let not_csv: ApiError = SessionError::NotCsv {
            file_name: "leads.xlsx".into(),
        }
        .into();
        assert_eq!(not_csv.into_response().status(), StatusCode::BAD_REQUEST);

        let busy: ApiError = SessionError::InvalidState {
            action: "upload a file",
            state: SessionState::Importing,
        }
        .into();
        assert_eq!(busy.into_response().status(), StatusCode::CONFLICT);

        let empty: ApiError = SessionError::Import(ImportError::NoValidRecords).into();
        assert_eq!(empty.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
