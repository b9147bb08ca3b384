pub mod egress;
pub mod ingress;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

// ─── Unified error type ──────────────────────────────────────────

/// Failures surfaced to HTTP clients as a status code plus a short text body.
#[derive(Debug)]
pub enum AppError {
    /// Bearer token missing or wrong. The store is left untouched.
    Forbidden,
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "incorrect or missing bearer token".to_string(),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal error while serving request");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, message).into_response()
    }
}
