//! Domain models for the vacation tracker.
//!
//! Dates are `chrono::NaiveDate` everywhere in the domain so that comparisons
//! are between calendar dates, never instants.

pub mod holiday;
pub mod settings;
pub mod vacation_request;

pub use holiday::Holiday;
pub use settings::{Settings, SettingsPatch, DEFAULT_AVAILABLE_DAYS};
pub use vacation_request::{NewVacationRequest, VacationRequest};

/// Storage and wire format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` string, ignoring surrounding whitespace
pub fn parse_date(value: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Format a date the way it is stored
pub fn format_date(date: chrono::NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
