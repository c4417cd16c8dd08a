use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Approval status of a vacation request.
///
/// Serialized exactly as stored in the `vacation_requests` collection:
/// `"Pending"`, `"Approved"` or `"Rejected"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// Stored representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
        }
    }

    /// Human-readable label for display
    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending approval",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored status string is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(pub String);

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown request status: '{}'", self.0)
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for RequestStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RequestStatus::Pending),
            "Approved" => Ok(RequestStatus::Approved),
            "Rejected" => Ok(RequestStatus::Rejected),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Stored document for a vacation request (collection `vacation_requests`).
/// The identifier is assigned by the store and is not part of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationRequestDocument {
    /// First requested day (YYYY-MM-DD)
    pub start_date: String,
    /// Last requested day, inclusive (YYYY-MM-DD)
    pub end_date: String,
    /// Business days counted when the request was submitted
    pub days: u32,
    pub status: RequestStatus,
    /// Submission date (YYYY-MM-DD)
    pub requested_on: String,
}

/// Stored document for a holiday (collection `holidays`, keyed by `date`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayDocument {
    pub name: String,
    /// YYYY-MM-DD, also the document key
    pub date: String,
}

/// Stored settings document. Absent fields are left untouched by a merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_days: Option<u32>,
}

/// The two screens of the application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    Dashboard,
    Config,
}

/// Everything the user can ask the application to do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    Navigate { view: ViewKind },
    SetStartDate { value: String },
    SetEndDate { value: String },
    SubmitRequest,
    CancelRequest { id: String },
    SetAllotment { value: String },
    SaveAllotment,
    SetHolidayName { value: String },
    SetHolidayDate { value: String },
    AddHoliday,
    DeleteHoliday { date: String },
}

/// Request body for switching screens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigateRequest {
    pub view: ViewKind,
}

/// Request body for any single form field edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftValueRequest {
    pub value: String,
}

/// Request body used by the approver to move a request out of Pending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequestStatusRequest {
    pub status: RequestStatus,
}

/// Outcome of classifying an entered date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeClassification {
    /// One or both dates are still empty
    Incomplete,
    /// A date does not parse, or start is after end
    InvalidRange,
    /// Valid range that only covers weekends and holidays
    NoBusinessDays,
    Valid,
}

/// Response of the stateless business-day calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessDaysResponse {
    pub start: String,
    pub end: String,
    pub business_days: u32,
    pub classification: RangeClassification,
}

/// Kinds of error that can occupy the single error slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRange,
    NoBusinessDays,
    InsufficientBalance,
    PersistenceFailure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorView {
    pub kind: ErrorKind,
    pub message: String,
}

/// Derived day balances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub available_days: u32,
    pub approved_days: i64,
    pub pending_days: i64,
    /// Can be negative when the allotment was lowered below committed days
    pub remaining_days: i64,
}

/// One line of the request history, most recent start date first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRow {
    pub id: String,
    pub start_date: String,
    pub end_date: String,
    pub days: u32,
    pub status: RequestStatus,
    pub status_label: String,
    pub requested_on: String,
    pub can_cancel: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayRow {
    pub name: String,
    pub date: String,
}

/// Request form and history screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub start_date: String,
    pub end_date: String,
    pub calculated_days: u32,
    pub can_submit: bool,
    /// Inline hint shown while the entered range exceeds the balance
    pub balance_warning: Option<String>,
    pub requests: Vec<RequestRow>,
}

/// Allotment and holiday configuration screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigView {
    pub allotment_draft: String,
    pub can_save: bool,
    pub holiday_name: String,
    pub holiday_date: String,
    pub can_add_holiday: bool,
    pub holidays: Vec<HolidayRow>,
}

/// Complete declarative description of what the client should display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    /// False while the session identity is not established yet (loading screen)
    pub auth_ready: bool,
    pub user_id: Option<String>,
    pub view: ViewKind,
    pub is_saving: bool,
    pub error: Option<ErrorView>,
    pub summary: BalanceSummary,
    pub dashboard: DashboardView,
    pub config: ConfigView,
}

/// Body returned by the REST layer on failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_document_uses_camel_case() {
        let document = VacationRequestDocument {
            start_date: "2024-12-23".to_string(),
            end_date: "2024-12-27".to_string(),
            days: 4,
            status: RequestStatus::Pending,
            requested_on: "2024-12-01".to_string(),
        };

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["startDate"], "2024-12-23");
        assert_eq!(json["endDate"], "2024-12-27");
        assert_eq!(json["days"], 4);
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["requestedOn"], "2024-12-01");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Approved".parse::<RequestStatus>(), Ok(RequestStatus::Approved));
        assert_eq!("Rejected".parse::<RequestStatus>(), Ok(RequestStatus::Rejected));
        assert!("approved".parse::<RequestStatus>().is_err());
        assert_eq!(RequestStatus::Pending.to_string(), "Pending");
    }

    #[test]
    fn test_settings_document_skips_missing_fields() {
        let empty = SettingsDocument::default();
        assert_eq!(serde_json::to_string(&empty).unwrap(), "{}");

        let parsed: SettingsDocument = serde_json::from_str(r#"{"availableDays": 22}"#).unwrap();
        assert_eq!(parsed.available_days, Some(22));
    }

    #[test]
    fn test_intent_is_tagged() {
        let intent: Intent =
            serde_json::from_str(r#"{"type": "set_start_date", "value": "2024-12-23"}"#).unwrap();
        assert_eq!(intent, Intent::SetStartDate { value: "2024-12-23".to_string() });

        let intent: Intent = serde_json::from_str(r#"{"type": "navigate", "view": "config"}"#).unwrap();
        assert_eq!(intent, Intent::Navigate { view: ViewKind::Config });

        let json = serde_json::to_string(&Intent::SubmitRequest).unwrap();
        assert_eq!(json, r#"{"type":"submit_request"}"#);
    }
}
