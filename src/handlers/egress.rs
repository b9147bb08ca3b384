use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
};
use std::sync::Arc;

use crate::store::SnapshotKey;
use crate::{AppState, PROM_CONTENT_TYPE};

use super::AppError;

// ─── GET /metrics/:job/:instance ─────────────────────────────────

/// Serves the last pushed snapshot for `(job, instance)` to the collector.
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path((job, instance)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let key = SnapshotKey::new(job, instance);

    let payload = state.store.get(&key).ok_or_else(|| {
        tracing::debug!(%key, "no snapshot stored");
        AppError::NotFound("not found".into())
    })?;

    axum::http::Response::builder()
        .header(header::CONTENT_TYPE, PROM_CONTENT_TYPE)
        .body(Body::from(payload))
        .map_err(|e| AppError::Internal(format!("failed to build response for {key}: {e}")))
}
