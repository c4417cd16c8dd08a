//! User-facing error kinds.
//!
//! Each variant renders, through `Display`, the single message shown in the
//! error slot. Underlying causes of persistence failures are logged where
//! they happen and never reach the message.

use shared::ErrorKind;
use std::fmt;

/// Store write or read that can fail on behalf of the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    LoadData,
    SubmitRequest,
    CancelRequest,
    SaveSettings,
    AddHoliday,
    DeleteHoliday,
}

impl StoreOperation {
    /// Whether the operation holds the saving flag while it is in flight
    pub fn holds_saving_flag(&self) -> bool {
        matches!(
            self,
            StoreOperation::SubmitRequest | StoreOperation::SaveSettings | StoreOperation::AddHoliday
        )
    }

    fn failure_message(&self) -> &'static str {
        match self {
            StoreOperation::LoadData => "Could not load your data. Please reload and try again.",
            StoreOperation::SubmitRequest => "Could not save the request. Please try again.",
            StoreOperation::CancelRequest => "Could not cancel the request. Please try again.",
            StoreOperation::SaveSettings => "Could not save the annual days. Please try again.",
            StoreOperation::AddHoliday => "Could not save the holiday. Please try again.",
            StoreOperation::DeleteHoliday => "Could not delete the holiday. Please try again.",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOperation::LoadData => "load data",
            StoreOperation::SubmitRequest => "submit request",
            StoreOperation::CancelRequest => "cancel request",
            StoreOperation::SaveSettings => "save settings",
            StoreOperation::AddHoliday => "add holiday",
            StoreOperation::DeleteHoliday => "delete holiday",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// Unparsable or inverted range, or nothing entered at submission time
    #[error("Please select a valid date range.")]
    InvalidRange,

    #[error("The selected dates contain no working days (they may all be weekends or holidays).")]
    NoBusinessDays,

    #[error("The request exceeds the remaining days ({remaining}).")]
    InsufficientBalance { requested: u32, remaining: i64 },

    #[error("{}", operation.failure_message())]
    PersistenceFailure { operation: StoreOperation },
}

impl TrackerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackerError::InvalidRange => ErrorKind::InvalidRange,
            TrackerError::NoBusinessDays => ErrorKind::NoBusinessDays,
            TrackerError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            TrackerError::PersistenceFailure { .. } => ErrorKind::PersistenceFailure,
        }
    }

    /// Errors produced by validating the request form; editing the dates
    /// re-evaluates (and may clear) them
    pub fn is_form_error(&self) -> bool {
        !matches!(self, TrackerError::PersistenceFailure { .. })
    }
}
