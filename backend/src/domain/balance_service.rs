//! Day balance calculations.
//!
//! Rejected requests never count against the allotment. Pending requests do,
//! so the user cannot over-commit while approvals are outstanding.

use shared::RequestStatus;

use super::models::VacationRequest;

/// Balances derived from the allotment and the current request list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBalance {
    pub available: u32,
    pub approved: i64,
    pub pending: i64,
    /// May be negative when the allotment was lowered below what is committed
    pub remaining: i64,
}

impl DayBalance {
    pub fn compute(available_days: u32, requests: &[VacationRequest]) -> Self {
        let approved = approved_days(requests);
        let pending = pending_days(requests);
        Self {
            available: available_days,
            approved,
            pending,
            remaining: i64::from(available_days) - approved - pending,
        }
    }
}

pub fn approved_days(requests: &[VacationRequest]) -> i64 {
    days_with_status(requests, RequestStatus::Approved)
}

pub fn pending_days(requests: &[VacationRequest]) -> i64 {
    days_with_status(requests, RequestStatus::Pending)
}

pub fn remaining_days(available_days: u32, requests: &[VacationRequest]) -> i64 {
    DayBalance::compute(available_days, requests).remaining
}

/// Requests ordered by start date, most recent first.
/// Requests sharing a start date keep their store order.
pub fn sorted_requests(requests: &[VacationRequest]) -> Vec<&VacationRequest> {
    let mut sorted: Vec<&VacationRequest> = requests.iter().collect();
    sorted.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    sorted
}

fn days_with_status(requests: &[VacationRequest], status: RequestStatus) -> i64 {
    requests
        .iter()
        .filter(|request| request.status == status)
        .map(|request| i64::from(request.days))
        .sum()
}
