use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use followtrack_sync::SyncError;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

/// `POST /api/v1/sync/trigger`: runs one pass to completion inside the
/// request and returns its report with 200.
///
/// Not routed in production (404). A pass already in flight, here or in
/// another process, yields 409.
pub(super) async fn trigger_sync(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    if state.env.is_production() {
        return Err(ApiError::new(req_id.0, "not_found", "not found"));
    }

    tracing::info!(request_id = %req_id.0, "sync: manual trigger");
    match state.engine.run_batch().await {
        Ok(report) => Ok((
            StatusCode::OK,
            Json(ApiResponse {
                data: report,
                meta: ResponseMeta::new(req_id.0),
            }),
        )),
        Err(SyncError::AlreadyRunning) => Err(ApiError::new(
            req_id.0,
            "conflict",
            "a sync pass is already running",
        )),
        Err(e) => {
            tracing::error!(error = %e, "sync: manual trigger failed");
            Err(ApiError::new(req_id.0, "internal_error", "sync pass failed"))
        }
    }
}
