//! Domain model for a vacation request.
use chrono::NaiveDate;
use shared::RequestStatus;

/// A persisted vacation request.
///
/// `days` is the business-day count snapshotted at submission; it is never
/// recomputed, even if holidays change later. Only `status` moves after
/// creation, and only through the approver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VacationRequest {
    /// Identifier assigned by the store
    pub id: String,
    pub start_date: NaiveDate,
    /// Inclusive
    pub end_date: NaiveDate,
    pub days: u32,
    pub status: RequestStatus,
    pub requested_on: NaiveDate,
}

impl VacationRequest {
    /// Only pending requests can be cancelled by the user
    pub fn is_cancellable(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// A request that has passed submission validation but has no id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVacationRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
    pub status: RequestStatus,
    pub requested_on: NaiveDate,
}

impl NewVacationRequest {
    /// Build a pending request submitted on `requested_on`
    pub fn pending(start_date: NaiveDate, end_date: NaiveDate, days: u32, requested_on: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            days,
            status: RequestStatus::Pending,
            requested_on,
        }
    }

    /// Attach the store-assigned identifier
    pub fn with_id(self, id: String) -> VacationRequest {
        VacationRequest {
            id,
            start_date: self.start_date,
            end_date: self.end_date,
            days: self.days,
            status: self.status,
            requested_on: self.requested_on,
        }
    }
}
