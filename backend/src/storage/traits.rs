//! # Storage Traits
//!
//! Storage abstraction shared by the CSV and SQLite backends. Every
//! collection is partitioned by user: implementations never return or touch
//! another user's documents.
//!
//! Besides one-shot reads and writes each collection offers a live
//! subscription. A subscription starts with the current full snapshot and
//! then yields a new full snapshot after every write to that user's
//! collection.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::RequestStatus;

use super::feed::Subscription;
use crate::domain::models::{Holiday, NewVacationRequest, Settings, SettingsPatch, VacationRequest};

/// Per-user vacation request collection
#[async_trait]
pub trait RequestStorage: Send + Sync {
    /// All requests of the user in store order (insertion order)
    async fn list_requests(&self, user_id: &str) -> Result<Vec<VacationRequest>>;

    /// Store a new request and return it with its assigned identifier
    async fn add_request(&self, user_id: &str, request: &NewVacationRequest) -> Result<VacationRequest>;

    /// Returns false when no request with that id exists
    async fn update_request_status(&self, user_id: &str, request_id: &str, status: RequestStatus) -> Result<bool>;

    /// Returns false when no request with that id exists
    async fn delete_request(&self, user_id: &str, request_id: &str) -> Result<bool>;

    async fn subscribe_requests(&self, user_id: &str) -> Result<Subscription<Vec<VacationRequest>>>;
}

/// Per-user holiday collection, keyed by date
#[async_trait]
pub trait HolidayStorage: Send + Sync {
    async fn list_holidays(&self, user_id: &str) -> Result<Vec<Holiday>>;

    /// Insert, or replace the holiday already stored on the same date
    async fn put_holiday(&self, user_id: &str, holiday: &Holiday) -> Result<()>;

    /// Returns false when no holiday is stored on that date
    async fn delete_holiday(&self, user_id: &str, date: NaiveDate) -> Result<bool>;

    async fn subscribe_holidays(&self, user_id: &str) -> Result<Subscription<Vec<Holiday>>>;
}

/// Per-user settings document
#[async_trait]
pub trait SettingsStorage: Send + Sync {
    /// `None` when the document (or its allotment field) does not exist yet
    async fn get_settings(&self, user_id: &str) -> Result<Option<Settings>>;

    /// Create the document or merge the fields set in the patch into it
    async fn merge_settings(&self, user_id: &str, patch: &SettingsPatch) -> Result<()>;

    async fn subscribe_settings(&self, user_id: &str) -> Result<Subscription<Option<Settings>>>;
}

/// Factory for the repositories of one storage backend
pub trait Connection: Send + Sync + Clone {
    type RequestRepository: RequestStorage + 'static;
    type HolidayRepository: HolidayStorage + 'static;
    type SettingsRepository: SettingsStorage + 'static;

    fn create_request_repository(&self) -> Self::RequestRepository;
    fn create_holiday_repository(&self) -> Self::HolidayRepository;
    fn create_settings_repository(&self) -> Self::SettingsRepository;
}
