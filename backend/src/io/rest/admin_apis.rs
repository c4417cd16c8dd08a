//! # REST API for the approver
//!
//! Approval and rejection happen outside the tracker's own flow: this route
//! writes the new status straight to the store, and the controller picks it
//! up through its request subscription like any other external change.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::put,
    Router,
};
use shared::UpdateRequestStatusRequest;
use tracing::{error, info, warn};

use super::error_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/requests/:id/status", put(update_request_status))
}

pub async fn update_request_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRequestStatusRequest>,
) -> impl IntoResponse {
    info!("PUT /api/admin/requests/{}/status - {}", id, request.status);

    let Some(user_id) = state.controller.current_view().user_id else {
        warn!("Status update for {} before the session is ready", id);
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "Session is not ready yet");
    };

    match state
        .store
        .requests
        .update_request_status(&user_id, &id, request.status)
        .await
    {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, format!("Request {} not found", id)),
        Err(e) => {
            error!("Failed to update status of request {}: {:#}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update request status")
        }
    }
}
