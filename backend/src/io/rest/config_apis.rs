//! # REST API for the configuration screen
//!
//! Draft edits for the allotment and the holiday form, plus saving the
//! allotment.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{post, put},
    Json, Router,
};
use shared::{DraftValueRequest, Intent};
use tracing::info;

use super::view_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config/allotment-draft", put(set_allotment))
        .route("/config/allotment", post(save_allotment))
        .route("/config/holiday-name", put(set_holiday_name))
        .route("/config/holiday-date", put(set_holiday_date))
}

pub async fn set_allotment(State(state): State<AppState>, Json(request): Json<DraftValueRequest>) -> impl IntoResponse {
    view_response(state.controller.dispatch(Intent::SetAllotment { value: request.value }).await)
}

pub async fn save_allotment(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/config/allotment");
    view_response(state.controller.dispatch(Intent::SaveAllotment).await)
}

pub async fn set_holiday_name(State(state): State<AppState>, Json(request): Json<DraftValueRequest>) -> impl IntoResponse {
    view_response(state.controller.dispatch(Intent::SetHolidayName { value: request.value }).await)
}

pub async fn set_holiday_date(State(state): State<AppState>, Json(request): Json<DraftValueRequest>) -> impl IntoResponse {
    view_response(state.controller.dispatch(Intent::SetHolidayDate { value: request.value }).await)
}
