//! Messages consumed by the reducer and effects it asks the controller to run.
//!
//! Intents come from the user through the REST layer. The other messages are
//! produced by the controller itself: the session becoming ready, store
//! snapshots arriving, and writes completing.

use chrono::NaiveDate;
use shared::Intent;
use std::fmt;

use super::errors::StoreOperation;
use super::models::{Holiday, NewVacationRequest, Settings, SettingsPatch, VacationRequest};

/// Stored collection a subscription is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Settings,
    VacationRequests,
    Holidays,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Settings => "settings",
            Collection::VacationRequests => "vacation_requests",
            Collection::Holidays => "holidays",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Intent(Intent),
    /// The session identity is established
    AuthReady { user_id: String },
    /// Settings snapshot; `None` when no settings document exists
    SettingsLoaded(Option<Settings>),
    RequestsLoaded(Vec<VacationRequest>),
    HolidaysLoaded(Vec<Holiday>),
    SubscriptionFailed { collection: Collection, cause: String },
    /// A write requested by an effect has been acknowledged or has failed
    WriteFinished { effect: Effect, result: Result<(), String> },
}

/// Store write requested by the reducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    AddRequest(NewVacationRequest),
    DeleteRequest { id: String },
    SaveSettings(SettingsPatch),
    PutHoliday(Holiday),
    DeleteHoliday { date: NaiveDate },
}

impl Effect {
    pub fn operation(&self) -> StoreOperation {
        match self {
            Effect::AddRequest(_) => StoreOperation::SubmitRequest,
            Effect::DeleteRequest { .. } => StoreOperation::CancelRequest,
            Effect::SaveSettings(_) => StoreOperation::SaveSettings,
            Effect::PutHoliday(_) => StoreOperation::AddHoliday,
            Effect::DeleteHoliday { .. } => StoreOperation::DeleteHoliday,
        }
    }
}
