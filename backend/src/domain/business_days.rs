//! Business-day counting.
//!
//! A business day is a Monday to Friday that is not a configured holiday.
//! Everything here works on `NaiveDate`, so there is no time-of-day or
//! timezone component that could shift a date by one.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use shared::RangeClassification;
use std::collections::HashSet;

use super::errors::TrackerError;
use super::models::{parse_date, Holiday};

/// Count the business days in `start..=end`.
///
/// Whole weeks contribute five days each, so the cost depends on the number
/// of holidays rather than the length of the range. Returns 0 when
/// `start > end`.
pub fn count_business_days(start: NaiveDate, end: NaiveDate, holidays: &HashSet<NaiveDate>) -> u32 {
    if start > end {
        return 0;
    }

    let total_days = (end - start).num_days() + 1;
    let full_weeks = total_days / 7;
    let mut weekdays = full_weeks * 5;

    // At most six leftover days after the whole weeks
    let mut current = start.checked_add_signed(Duration::days(full_weeks * 7));
    while let Some(day) = current.filter(|day| *day <= end) {
        if is_weekday(day) {
            weekdays += 1;
        }
        current = day.succ_opt();
    }

    let closed = holidays
        .iter()
        .filter(|date| **date >= start && **date <= end && is_weekday(**date))
        .count() as i64;

    u32::try_from(weekdays - closed).unwrap_or(u32::MAX)
}

/// Monday to Friday
pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Holiday dates used to exclude days from a count
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    holidays: HashSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn from_holidays(holidays: &[Holiday]) -> Self {
        Self::new(holidays.iter().map(|holiday| holiday.date))
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        is_weekday(date) && !self.is_holiday(date)
    }

    pub fn count_business_days(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        count_business_days(start, end, &self.holidays)
    }

    /// Classify a range as typed by the user (`YYYY-MM-DD` strings)
    pub fn evaluate(&self, start: &str, end: &str) -> RangeEvaluation {
        if start.trim().is_empty() || end.trim().is_empty() {
            return RangeEvaluation::Incomplete;
        }

        let (start, end) = match (parse_calendar_date(start), parse_calendar_date(end)) {
            (Some(start), Some(end)) if start <= end => (start, end),
            _ => return RangeEvaluation::InvalidRange,
        };

        match self.count_business_days(start, end) {
            0 => RangeEvaluation::NoBusinessDays,
            days => RangeEvaluation::Valid { start, end, days },
        }
    }
}

/// Years a date input can hold; chrono alone would accept signed years
/// far outside what a request form can mean.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    parse_date(value).filter(|date| YEAR_RANGE.contains(&date.year()))
}

/// Result of evaluating the entered date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEvaluation {
    /// At least one of the two dates has not been entered yet
    Incomplete,
    InvalidRange,
    NoBusinessDays,
    Valid {
        start: NaiveDate,
        end: NaiveDate,
        days: u32,
    },
}

impl RangeEvaluation {
    /// Business days in the range, 0 for anything but a valid range
    pub fn business_days(&self) -> u32 {
        match self {
            RangeEvaluation::Valid { days, .. } => *days,
            _ => 0,
        }
    }

    pub fn classification(&self) -> RangeClassification {
        match self {
            RangeEvaluation::Incomplete => RangeClassification::Incomplete,
            RangeEvaluation::InvalidRange => RangeClassification::InvalidRange,
            RangeEvaluation::NoBusinessDays => RangeClassification::NoBusinessDays,
            RangeEvaluation::Valid { .. } => RangeClassification::Valid,
        }
    }

    /// Error to show while the user is still editing. An incomplete range is
    /// not an error yet.
    pub fn editing_error(&self) -> Option<TrackerError> {
        match self {
            RangeEvaluation::InvalidRange => Some(TrackerError::InvalidRange),
            RangeEvaluation::NoBusinessDays => Some(TrackerError::NoBusinessDays),
            RangeEvaluation::Incomplete | RangeEvaluation::Valid { .. } => None,
        }
    }

    /// Error to show when the user tries to submit this range
    pub fn submission_error(&self) -> Option<TrackerError> {
        match self {
            RangeEvaluation::Incomplete | RangeEvaluation::InvalidRange => Some(TrackerError::InvalidRange),
            RangeEvaluation::NoBusinessDays => Some(TrackerError::NoBusinessDays),
            RangeEvaluation::Valid { .. } => None,
        }
    }
}
