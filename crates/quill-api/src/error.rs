//! HTTP error mapping for quill-api.
//!
//! Every handler returns `Result<_, ApiError>`; domain errors convert via
//! `From<quill_core::Error>` so `?` works on repository and client calls.
//! Error responses always carry a `{"message": "..."}` JSON body.

use axum::{http::StatusCode, response::IntoResponse, Json};

/// API-level error, mapped to an HTTP status and a JSON message body.
#[derive(Debug)]
pub enum ApiError {
    /// Unexpected failure surfaced to the client as a 500.
    Internal(quill_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    /// Upstream service (assist) failed; surfaced as a 502.
    BadGateway(String),
}

impl From<quill_core::Error> for ApiError {
    fn from(err: quill_core::Error) -> Self {
        use quill_core::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::NoteNotFound(id) => ApiError::NotFound(format!("Note not found: {}", id)),
            Error::UserNotFound(id) => ApiError::NotFound(format!("User not found: {}", id)),
            Error::FolderNotFound(id) => ApiError::NotFound(format!("Folder not found: {}", id)),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::Assist(msg) => ApiError::BadGateway(format!("Assist service error: {}", msg)),
            Error::Request(msg) => ApiError::BadGateway(format!("Upstream request failed: {}", msg)),
            err if err.is_unique_violation() => {
                ApiError::Conflict("resource already exists".to_string())
            }
            err => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(serde_json::json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}
