//! Storage layer.
//!
//! Two interchangeable backends implement the traits in [`traits`]: plain
//! files (CSV for collections, YAML for the settings document) and SQLite.

pub mod csv;
pub mod feed;
pub mod mappers;
pub mod sqlite;
pub mod traits;

use std::sync::Arc;

pub use feed::{LiveCollection, LiveCollections, SnapshotFeed, Subscription};
pub use traits::{Connection, HolidayStorage, RequestStorage, SettingsStorage};

/// Type-erased repositories handed to the controller and the REST layer
#[derive(Clone)]
pub struct StoreHandles {
    pub requests: Arc<dyn RequestStorage>,
    pub holidays: Arc<dyn HolidayStorage>,
    pub settings: Arc<dyn SettingsStorage>,
}

impl StoreHandles {
    pub fn from_connection<C: Connection>(connection: &C) -> Self {
        Self {
            requests: Arc::new(connection.create_request_repository()),
            holidays: Arc::new(connection.create_holiday_repository()),
            settings: Arc::new(connection.create_settings_repository()),
        }
    }
}
