//! Application state and the reducer that evolves it.
//!
//! `update` is a pure function: given the current state, one message and the
//! current date it returns the next state plus the store writes to perform.
//! All I/O lives in the controller, which feeds the results back in as
//! messages.

use chrono::NaiveDate;
use log::{debug, error, info, warn};
use shared::{Intent, ViewKind};

use super::balance_service::remaining_days;
use super::business_days::{HolidayCalendar, RangeEvaluation};
use super::commands::{Effect, Message};
use super::errors::{StoreOperation, TrackerError};
use super::models::{parse_date, Holiday, NewVacationRequest, Settings, SettingsPatch, VacationRequest};

/// Vacation request form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestForm {
    pub start_date: String,
    pub end_date: String,
}

impl RequestForm {
    pub fn clear(&mut self) {
        self.start_date.clear();
        self.end_date.clear();
    }
}

/// Configuration screen drafts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigForm {
    /// Annual allotment as typed, not yet saved
    pub allotment: String,
    pub holiday_name: String,
    pub holiday_date: String,
}

impl ConfigForm {
    pub fn clear_holiday(&mut self) {
        self.holiday_name.clear();
        self.holiday_date.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerState {
    pub view: ViewKind,
    pub auth_ready: bool,
    pub user_id: Option<String>,
    pub settings: Settings,
    pub requests: Vec<VacationRequest>,
    /// Ascending by date
    pub holidays: Vec<Holiday>,
    pub calendar: HolidayCalendar,
    pub is_saving: bool,
    pub error: Option<TrackerError>,
    pub request_form: RequestForm,
    /// Evaluation of `request_form` against `calendar`, refreshed whenever
    /// either changes
    range: RangeEvaluation,
    pub config_form: ConfigForm,
}

impl Default for TrackerState {
    /// Nothing is loaded yet, so the balance is zero until the first settings
    /// snapshot arrives.
    fn default() -> Self {
        Self {
            view: ViewKind::Dashboard,
            auth_ready: false,
            user_id: None,
            settings: Settings { available_days: 0 },
            requests: Vec::new(),
            holidays: Vec::new(),
            calendar: HolidayCalendar::default(),
            is_saving: false,
            error: None,
            request_form: RequestForm::default(),
            range: RangeEvaluation::Incomplete,
            config_form: ConfigForm {
                allotment: "0".to_string(),
                ..ConfigForm::default()
            },
        }
    }
}

impl TrackerState {
    pub fn range_evaluation(&self) -> RangeEvaluation {
        self.range
    }

    fn reevaluate_range(&mut self) {
        self.range = self
            .calendar
            .evaluate(&self.request_form.start_date, &self.request_form.end_date);
    }

    pub fn calculated_days(&self) -> u32 {
        self.range_evaluation().business_days()
    }

    pub fn remaining_days(&self) -> i64 {
        remaining_days(self.settings.available_days, &self.requests)
    }

    pub fn can_submit(&self) -> bool {
        let calculated = self.calculated_days();
        self.auth_ready && calculated > 0 && i64::from(calculated) <= self.remaining_days() && !self.is_saving
    }

    pub fn can_add_holiday(&self) -> bool {
        self.auth_ready
            && !self.is_saving
            && !self.config_form.holiday_name.trim().is_empty()
            && parse_date(&self.config_form.holiday_date).is_some()
    }

    fn apply_intent(&mut self, intent: Intent, today: NaiveDate) -> Vec<Effect> {
        if !self.auth_ready {
            warn!("Ignoring {:?} before the session is ready", intent);
            return Vec::new();
        }

        match intent {
            Intent::Navigate { view } => {
                if view == ViewKind::Config {
                    self.config_form.allotment = self.settings.available_days.to_string();
                }
                self.view = view;
                Vec::new()
            }
            Intent::SetStartDate { value } => {
                self.request_form.start_date = value;
                self.reevaluate_range();
                self.refresh_form_error();
                Vec::new()
            }
            Intent::SetEndDate { value } => {
                self.request_form.end_date = value;
                self.reevaluate_range();
                self.refresh_form_error();
                Vec::new()
            }
            Intent::SubmitRequest => self.submit_request(today),
            Intent::CancelRequest { id } => self.cancel_request(id),
            Intent::SetAllotment { value } => {
                self.config_form.allotment = value;
                Vec::new()
            }
            Intent::SaveAllotment => self.save_allotment(),
            Intent::SetHolidayName { value } => {
                self.config_form.holiday_name = value;
                Vec::new()
            }
            Intent::SetHolidayDate { value } => {
                self.config_form.holiday_date = value;
                Vec::new()
            }
            Intent::AddHoliday => self.add_holiday(),
            Intent::DeleteHoliday { date } => self.delete_holiday(&date),
        }
    }

    fn submit_request(&mut self, today: NaiveDate) -> Vec<Effect> {
        if self.is_saving {
            debug!("Submission ignored while another save is in flight");
            return Vec::new();
        }
        self.error = None;

        let evaluation = self.range_evaluation();
        let (start, end, days) = match evaluation {
            RangeEvaluation::Valid { start, end, days } => (start, end, days),
            _ => {
                self.error = evaluation.submission_error();
                return Vec::new();
            }
        };

        let remaining = self.remaining_days();
        if i64::from(days) > remaining {
            info!("Rejecting request of {} days, only {} remaining", days, remaining);
            self.error = Some(TrackerError::InsufficientBalance { requested: days, remaining });
            return Vec::new();
        }

        info!("Submitting request {} to {} ({} business days)", start, end, days);
        self.is_saving = true;
        vec![Effect::AddRequest(NewVacationRequest::pending(start, end, days, today))]
    }

    fn cancel_request(&mut self, id: String) -> Vec<Effect> {
        match self.requests.iter().find(|request| request.id == id) {
            Some(request) if request.is_cancellable() => {
                info!("Cancelling pending request {}", id);
                vec![Effect::DeleteRequest { id }]
            }
            Some(request) => {
                warn!("Request {} is {} and cannot be cancelled", id, request.status);
                Vec::new()
            }
            None => {
                warn!("Request {} not found, nothing to cancel", id);
                Vec::new()
            }
        }
    }

    fn save_allotment(&mut self) -> Vec<Effect> {
        if self.is_saving {
            debug!("Save ignored while another save is in flight");
            return Vec::new();
        }
        self.error = None;

        let days = parse_allotment(&self.config_form.allotment);
        info!("Saving annual allotment of {} days", days);
        self.is_saving = true;
        vec![Effect::SaveSettings(SettingsPatch::available_days(days))]
    }

    fn add_holiday(&mut self) -> Vec<Effect> {
        if self.is_saving {
            debug!("Holiday ignored while another save is in flight");
            return Vec::new();
        }
        self.error = None;

        let name = self.config_form.holiday_name.trim();
        let date = parse_date(&self.config_form.holiday_date);
        let holiday = match date {
            Some(date) if !name.is_empty() => Holiday::new(name, date),
            _ => {
                debug!("Holiday draft incomplete, nothing to add");
                return Vec::new();
            }
        };

        info!("Adding holiday '{}' on {}", holiday.name, holiday.date);
        self.is_saving = true;
        vec![Effect::PutHoliday(holiday)]
    }

    fn delete_holiday(&mut self, date: &str) -> Vec<Effect> {
        self.error = None;
        match parse_date(date) {
            Some(date) => {
                info!("Deleting holiday on {}", date);
                vec![Effect::DeleteHoliday { date }]
            }
            None => {
                warn!("Cannot delete holiday with unparsable date '{}'", date);
                Vec::new()
            }
        }
    }

    /// Settle a write once the store has answered.
    ///
    /// The request form is cleared here, on acknowledgement, rather than
    /// optimistically when the submission is reduced: a failed write keeps
    /// the entered dates so the user can retry them.
    fn finish_write(&mut self, effect: Effect, result: Result<(), String>) {
        let operation = effect.operation();
        if operation.holds_saving_flag() {
            self.is_saving = false;
        }

        if let Err(cause) = result {
            error!("Failed to {}: {}", operation, cause);
            self.error = Some(TrackerError::PersistenceFailure { operation });
            return;
        }

        match effect {
            Effect::AddRequest(_) => {
                self.request_form.clear();
                self.reevaluate_range();
                self.error = None;
            }
            Effect::SaveSettings(patch) => {
                if let Some(days) = patch.available_days {
                    self.settings.available_days = days;
                }
                self.view = ViewKind::Dashboard;
            }
            Effect::PutHoliday(_) => self.config_form.clear_holiday(),
            Effect::DeleteRequest { .. } | Effect::DeleteHoliday { .. } => {}
        }
    }

    /// Re-evaluate the request form after the dates or the holidays changed
    fn refresh_form_error(&mut self) {
        match self.range_evaluation().editing_error() {
            Some(error) => self.error = Some(error),
            None => {
                if self.error.as_ref().is_some_and(TrackerError::is_form_error) {
                    self.error = None;
                }
            }
        }
    }
}

/// Reduce one message into the next state and the writes it requires
pub fn update(mut state: TrackerState, message: Message, today: NaiveDate) -> (TrackerState, Vec<Effect>) {
    let effects = match message {
        Message::Intent(intent) => state.apply_intent(intent, today),
        Message::AuthReady { user_id } => {
            info!("Session ready for user {}", user_id);
            state.auth_ready = true;
            state.user_id = Some(user_id);
            Vec::new()
        }
        Message::SettingsLoaded(settings) => {
            state.settings = settings.unwrap_or_default();
            state.config_form.allotment = state.settings.available_days.to_string();
            Vec::new()
        }
        Message::RequestsLoaded(requests) => {
            debug!("Loaded {} vacation requests", requests.len());
            state.requests = requests;
            Vec::new()
        }
        Message::HolidaysLoaded(mut holidays) => {
            debug!("Loaded {} holidays", holidays.len());
            holidays.sort_by_key(|holiday| holiday.date);
            state.calendar = HolidayCalendar::from_holidays(&holidays);
            state.reevaluate_range();
            state.holidays = holidays;
            state.refresh_form_error();
            Vec::new()
        }
        Message::SubscriptionFailed { collection, cause } => {
            error!("Subscription to {} failed: {}", collection, cause);
            state.error = Some(TrackerError::PersistenceFailure {
                operation: StoreOperation::LoadData,
            });
            Vec::new()
        }
        Message::WriteFinished { effect, result } => {
            state.finish_write(effect, result);
            Vec::new()
        }
    };
    (state, effects)
}

/// Allotment to save for a draft: floored, never negative, 0 when unparsable
pub fn parse_allotment(draft: &str) -> u32 {
    let trimmed = draft.trim();
    if trimmed.is_empty() {
        return 0;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value.floor().clamp(0.0, f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}
