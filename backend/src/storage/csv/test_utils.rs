//! Temp-dir backed store for tests.
//!
//! The data directory lives in a `TempDir` that is removed when the
//! environment drops, panicking tests included.

use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

use super::connection::CsvConnection;
use crate::storage::StoreHandles;

pub struct TestEnvironment {
    pub connection: CsvConnection,
    /// Root of the temp data directory, also usable for the identity file
    pub base_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::with_prefix("vacation-tracker-")?;
        let base_path = temp_dir.path().to_path_buf();
        Ok(Self {
            connection: CsvConnection::new(&base_path)?,
            base_path,
            _temp_dir: temp_dir,
        })
    }

    /// Repositories over this environment's connection, sharing its live feeds
    pub fn store(&self) -> StoreHandles {
        StoreHandles::from_connection(&self.connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{parse_date, Holiday};

    #[test]
    fn test_data_removed_on_drop() {
        let env = TestEnvironment::new().unwrap();
        let base_path = env.base_path.clone();
        assert!(base_path.exists());

        drop(env);
        assert!(!base_path.exists());
    }

    #[tokio::test]
    async fn test_store_handles_share_feeds() {
        let env = TestEnvironment::new().unwrap();
        let writer = env.store();
        let reader = env.store();

        let mut holidays = reader.holidays.subscribe_holidays("user-1").await.unwrap();
        assert_eq!(holidays.next().await, Some(Vec::new()));

        let christmas = Holiday::new("Christmas", parse_date("2024-12-25").unwrap());
        writer.holidays.put_holiday("user-1", &christmas).await.unwrap();
        assert_eq!(holidays.next().await, Some(vec![christmas]));
    }
}
