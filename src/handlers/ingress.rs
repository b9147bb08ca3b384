use axum::{
    body::{self, Body},
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
};
use std::sync::Arc;

use crate::store::SnapshotKey;
use crate::AppState;

use super::AppError;

// ─── PUT /metrics/:job/:instance ─────────────────────────────────

/// Stores the request body as the latest snapshot for `(job, instance)`.
///
/// The token is checked before the path or body is looked at, so an
/// unauthenticated push is always 403 and never touches the store.
pub async fn put_snapshot(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String)>, PathRejection>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, AppError> {
    if !is_authorized(&headers, &state.expected_bearer_token) {
        tracing::warn!("rejected push with bad or missing bearer token");
        return Err(AppError::Forbidden);
    }

    let Path((job, instance)) = path.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let payload = body::to_bytes(body, usize::MAX).await.map_err(|e| {
        tracing::warn!(%job, %instance, error = %e, "failed to read push body");
        AppError::BadRequest("failed to read request body".into())
    })?;

    tracing::debug!(%job, %instance, bytes = payload.len(), "snapshot stored");
    state.store.put(SnapshotKey::new(job, instance), payload);

    Ok(StatusCode::OK)
}

// ─── Helpers ─────────────────────────────────────────────────────

fn is_authorized(headers: &HeaderMap, expected_token: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected_token)
}
