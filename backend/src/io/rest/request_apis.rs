//! # REST API for vacation requests
//!
//! Editing the request form, submitting it and cancelling pending requests.
//! Submission and cancellation return as soon as the reducer has run; the
//! stored outcome arrives through the next views.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, post, put},
    Json, Router,
};
use shared::{DraftValueRequest, Intent};
use tracing::info;

use super::view_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/draft/start-date", put(set_start_date))
        .route("/draft/end-date", put(set_end_date))
        .route("/requests", post(submit_request))
        .route("/requests/:id", delete(cancel_request))
}

pub async fn set_start_date(State(state): State<AppState>, Json(request): Json<DraftValueRequest>) -> impl IntoResponse {
    view_response(state.controller.dispatch(Intent::SetStartDate { value: request.value }).await)
}

pub async fn set_end_date(State(state): State<AppState>, Json(request): Json<DraftValueRequest>) -> impl IntoResponse {
    view_response(state.controller.dispatch(Intent::SetEndDate { value: request.value }).await)
}

pub async fn submit_request(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/requests");
    view_response(state.controller.dispatch(Intent::SubmitRequest).await)
}

pub async fn cancel_request(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/requests/{}", id);
    view_response(state.controller.dispatch(Intent::CancelRequest { id }).await)
}
