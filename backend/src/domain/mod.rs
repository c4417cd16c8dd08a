//! Domain layer: business-day counting, balances, the reducer and the
//! controller task that drives it.

pub mod balance_service;
pub mod business_days;
pub mod commands;
pub mod controller;
pub mod errors;
pub mod identity_service;
pub mod models;
pub mod state;
pub mod view;

pub use business_days::{count_business_days, HolidayCalendar, RangeEvaluation};
pub use controller::{ControllerError, ControllerHandle, TrackerController};
pub use errors::{StoreOperation, TrackerError};
pub use identity_service::IdentityService;
pub use state::TrackerState;
