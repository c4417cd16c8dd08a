//! # REST API for the business-day calculator
//!
//! Stateless counting of a date range against the holidays in the current
//! view. Nothing is stored and the request form is left untouched.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use shared::BusinessDaysResponse;
use tracing::debug;

use crate::domain::models::parse_date;
use crate::domain::HolidayCalendar;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BusinessDaysQuery {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/business-days", get(business_days))
}

pub async fn business_days(State(state): State<AppState>, Query(query): Query<BusinessDaysQuery>) -> impl IntoResponse {
    let view = state.controller.current_view();
    let calendar = HolidayCalendar::new(view.config.holidays.iter().filter_map(|row| parse_date(&row.date)));
    let evaluation = calendar.evaluate(&query.start, &query.end);
    debug!("Business days {} to {}: {:?}", query.start, query.end, evaluation);

    let response = BusinessDaysResponse {
        business_days: evaluation.business_days(),
        classification: evaluation.classification(),
        start: query.start,
        end: query.end,
    };
    (StatusCode::OK, Json(response))
}
