//! # REST API Interface Layer
//!
//! HTTP endpoints for the presentation client. Handlers translate requests
//! into intents for the controller and answer with the freshly rendered
//! [`ViewModel`]; they hold no business logic of their own.
//!
//! The only routes that bypass the controller are the approver's status
//! update, which writes straight to the store like any external system
//! would, and the stateless business-day calculator.

pub mod admin_apis;
pub mod calculator_apis;
pub mod config_apis;
pub mod holiday_apis;
pub mod request_apis;
pub mod view_apis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Router,
};
use shared::{ErrorResponse, ViewModel};
use tracing::error;

use crate::domain::ControllerError;
use crate::AppState;

/// All API routes, to be nested under `/api`
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(view_apis::router())
        .merge(request_apis::router())
        .merge(config_apis::router())
        .merge(holiday_apis::router())
        .merge(admin_apis::router())
        .merge(calculator_apis::router())
}

/// Answer with the rendered view, or 503 once the controller is gone
pub(crate) fn view_response(result: Result<ViewModel, ControllerError>) -> Response {
    match result {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => {
            error!("Controller unavailable: {}", e);
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { message: message.into() })).into_response()
}
