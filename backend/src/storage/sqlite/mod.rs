//! # SQLite Storage Module
//!
//! Same collections as the CSV backend, kept in three tables of one
//! database. Rows carry a `user_id` column and every query filters on it.

pub mod connection;
pub mod holiday_repository;
pub mod request_repository;
pub mod settings_repository;

pub use connection::DbConnection;
pub use holiday_repository::HolidayRepository as SqliteHolidayRepository;
pub use request_repository::RequestRepository as SqliteRequestRepository;
pub use settings_repository::SettingsRepository as SqliteSettingsRepository;
