//! Domain model for a configured holiday.
use chrono::NaiveDate;

/// A non-working day. The date is the natural key: adding another holiday on
/// the same date replaces this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holiday {
    pub name: String,
    pub date: NaiveDate,
}

impl Holiday {
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date,
        }
    }
}
