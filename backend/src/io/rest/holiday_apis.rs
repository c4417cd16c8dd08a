use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, post},
    Router,
};
use shared::Intent;
use tracing::info;

use super::view_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/holidays", post(add_holiday))
        .route("/holidays/:date", delete(delete_holiday))
}

/// Add the holiday currently entered in the config form
pub async fn add_holiday(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/holidays");
    view_response(state.controller.dispatch(Intent::AddHoliday).await)
}

pub async fn delete_holiday(State(state): State<AppState>, Path(date): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/holidays/{}", date);
    view_response(state.controller.dispatch(Intent::DeleteHoliday { date }).await)
}

#[cfg(test)]
mod tests {
    use crate::domain::controller::wait_for_view;
    use crate::io::rest::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use shared::ViewModel;

    #[tokio::test]
    async fn test_add_and_delete_holiday() {
        let app = TestApp::new().await;
        app.send(Method::PUT, "/draft/start-date", Some(json!({ "value": "2024-12-23" })))
            .await;
        app.send(Method::PUT, "/draft/end-date", Some(json!({ "value": "2024-12-27" })))
            .await;
        app.send(Method::PUT, "/config/holiday-name", Some(json!({ "value": "Christmas" })))
            .await;
        app.send(Method::PUT, "/config/holiday-date", Some(json!({ "value": "2024-12-25" })))
            .await;

        let (status, _): (_, ViewModel) = app.send_json(Method::POST, "/holidays", None).await;
        assert_eq!(status, StatusCode::OK);

        let view = wait_for_view(&app.state.controller, |view| view.config.holidays.len() == 1).await;
        assert_eq!(view.config.holidays[0].name, "Christmas");
        assert_eq!(view.config.holidays[0].date, "2024-12-25");
        assert_eq!(view.dashboard.calculated_days, 4);

        let (status, _): (_, ViewModel) = app.send_json(Method::DELETE, "/holidays/2024-12-25", None).await;
        assert_eq!(status, StatusCode::OK);

        let view = wait_for_view(&app.state.controller, |view| view.config.holidays.is_empty()).await;
        assert_eq!(view.dashboard.calculated_days, 5);
    }

    #[tokio::test]
    async fn test_add_without_form_is_a_no_op() {
        let app = TestApp::new().await;

        let (status, view): (_, ViewModel) = app.send_json(Method::POST, "/holidays", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!view.is_saving);
        assert!(view.config.holidays.is_empty());
    }
}
