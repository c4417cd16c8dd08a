//! Rendering of the state into the view model served to clients.

use shared::{
    BalanceSummary, ConfigView, DashboardView, ErrorView, HolidayRow, RequestRow, ViewModel,
};

use super::balance_service::{sorted_requests, DayBalance};
use super::models::{format_date, Holiday, VacationRequest};
use super::state::TrackerState;

pub fn render(state: &TrackerState) -> ViewModel {
    let balance = DayBalance::compute(state.settings.available_days, &state.requests);
    let calculated = state.calculated_days();

    let balance_warning = if !state.is_saving && i64::from(calculated) > balance.remaining {
        Some(format!(
            "Not enough days left: the range needs {} and only {} remain.",
            calculated, balance.remaining
        ))
    } else {
        None
    };

    ViewModel {
        auth_ready: state.auth_ready,
        user_id: state.user_id.clone(),
        view: state.view,
        is_saving: state.is_saving,
        error: state.error.as_ref().map(|error| ErrorView {
            kind: error.kind(),
            message: error.to_string(),
        }),
        summary: BalanceSummary {
            available_days: balance.available,
            approved_days: balance.approved,
            pending_days: balance.pending,
            remaining_days: balance.remaining,
        },
        dashboard: DashboardView {
            start_date: state.request_form.start_date.clone(),
            end_date: state.request_form.end_date.clone(),
            calculated_days: calculated,
            can_submit: state.can_submit(),
            balance_warning,
            requests: sorted_requests(&state.requests).into_iter().map(request_row).collect(),
        },
        config: ConfigView {
            allotment_draft: state.config_form.allotment.clone(),
            can_save: state.auth_ready && !state.is_saving,
            holiday_name: state.config_form.holiday_name.clone(),
            holiday_date: state.config_form.holiday_date.clone(),
            can_add_holiday: state.can_add_holiday(),
            holidays: state.holidays.iter().map(holiday_row).collect(),
        },
    }
}

fn request_row(request: &VacationRequest) -> RequestRow {
    RequestRow {
        id: request.id.clone(),
        start_date: format_date(request.start_date),
        end_date: format_date(request.end_date),
        days: request.days,
        status: request.status,
        status_label: request.status.label().to_string(),
        requested_on: format_date(request.requested_on),
        can_cancel: request.is_cancellable(),
    }
}

fn holiday_row(holiday: &Holiday) -> HolidayRow {
    HolidayRow {
        name: holiday.name.clone(),
        date: format_date(holiday.date),
    }
}
