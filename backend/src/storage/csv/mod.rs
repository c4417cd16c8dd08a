//! # CSV Storage Module
//!
//! File-based storage, one directory per user under the data directory.
//!
//! ## File Structure
//!
//! ```text
//! data/
//! ├── identity.yaml
//! └── users/
//!     └── {user_id}/
//!         ├── vacation_requests.csv
//!         ├── holidays.csv
//!         └── settings.yaml
//! ```
//!
//! Every write goes to a temporary file that is then renamed over the
//! original, so a crash never leaves a half-written file behind.

pub mod connection;
pub mod holiday_repository;
pub mod request_repository;
pub mod settings_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::CsvConnection;
pub use holiday_repository::HolidayRepository;
pub use request_repository::RequestRepository;
pub use settings_repository::SettingsRepository;
