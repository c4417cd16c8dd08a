//! # REST API for the view
//!
//! Reading the current view and switching screens.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use shared::{Intent, NavigateRequest};
use tracing::info;

use super::view_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/view", get(get_view))
        .route("/navigate", post(navigate))
}

/// Latest rendered view
pub async fn get_view(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.controller.current_view()))
}

pub async fn navigate(State(state): State<AppState>, Json(request): Json<NavigateRequest>) -> impl IntoResponse {
    info!("POST /api/navigate - {:?}", request.view);
    view_response(state.controller.dispatch(Intent::Navigate { view: request.view }).await)
}
