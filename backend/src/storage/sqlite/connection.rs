use anyhow::{Context, Result};
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

use super::{SqliteHolidayRepository, SqliteRequestRepository, SqliteSettingsRepository};
use crate::storage::feed::LiveCollections;
use crate::storage::traits::Connection;

/// DbConnection owns the pool and the live collections of one database
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
    collections: LiveCollections,
}

impl DbConnection {
    /// Open (creating if missing) the database at `url`, e.g. `sqlite://data/tracker.db`
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database url {}", url))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {}", url))?;
        info!("Connected to database {}", url);
        Self::from_pool(pool).await
    }

    /// Private in-memory database. A single connection that never expires
    /// keeps the data alive for the lifetime of the pool.
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        Self::setup_schema(&pool).await?;
        Ok(Self {
            pool: Arc::new(pool),
            collections: LiveCollections::default(),
        })
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vacation_requests (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                days INTEGER NOT NULL,
                status TEXT NOT NULL,
                requested_on TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_vacation_requests_user ON vacation_requests (user_id);")
            .execute(pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS holidays (
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                name TEXT NOT NULL,
                PRIMARY KEY (user_id, date)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                user_id TEXT PRIMARY KEY,
                available_days INTEGER
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn collections(&self) -> &LiveCollections {
        &self.collections
    }
}

impl Connection for DbConnection {
    type RequestRepository = SqliteRequestRepository;
    type HolidayRepository = SqliteHolidayRepository;
    type SettingsRepository = SqliteSettingsRepository;

    fn create_request_repository(&self) -> Self::RequestRepository {
        SqliteRequestRepository::new(self.clone())
    }

    fn create_holiday_repository(&self) -> Self::HolidayRepository {
        SqliteHolidayRepository::new(self.clone())
    }

    fn create_settings_repository(&self) -> Self::SettingsRepository {
        SqliteSettingsRepository::new(self.clone())
    }
}
