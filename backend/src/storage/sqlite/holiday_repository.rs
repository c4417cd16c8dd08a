use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{info, warn};
use shared::HolidayDocument;
use sqlx::Row;

use super::connection::DbConnection;
use crate::domain::models::{format_date, Holiday};
use crate::storage::feed::{LiveCollection, Subscription};
use crate::storage::mappers::HolidayMapper;
use crate::storage::traits::HolidayStorage;

/// SQLite holiday repository, keyed by (user, date)
#[derive(Clone)]
pub struct HolidayRepository {
    db: DbConnection,
}

impl HolidayRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn collection(&self) -> &LiveCollection<Vec<Holiday>> {
        &self.db.collections().holidays
    }

    async fn load(&self, user_id: &str) -> Result<Vec<Holiday>> {
        let rows = sqlx::query("SELECT name, date FROM holidays WHERE user_id = ? ORDER BY rowid")
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await
            .context("Failed to query holidays")?;

        let mut holidays = Vec::with_capacity(rows.len());
        for row in &rows {
            let document = HolidayDocument {
                name: row.try_get("name")?,
                date: row.try_get("date")?,
            };
            match HolidayMapper::to_domain(document) {
                Ok(holiday) => holidays.push(holiday),
                Err(e) => warn!("Skipping unreadable holiday for user {}: {:#}", user_id, e),
            }
        }
        Ok(holidays)
    }

    async fn publish(&self, user_id: &str) {
        let feed = &self.collection().feed;
        if !feed.is_watched(user_id) {
            return;
        }
        match self.load(user_id).await {
            Ok(holidays) => feed.publish(user_id, holidays),
            Err(e) => warn!("Could not reload holidays for user {}: {:#}", user_id, e),
        }
    }
}

#[async_trait]
impl HolidayStorage for HolidayRepository {
    async fn list_holidays(&self, user_id: &str) -> Result<Vec<Holiday>> {
        self.load(user_id).await
    }

    async fn put_holiday(&self, user_id: &str, holiday: &Holiday) -> Result<()> {
        let _guard = self.collection().lock().await;

        let document = HolidayMapper::to_document(holiday);
        sqlx::query(
            r#"
            INSERT INTO holidays (user_id, date, name)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, date) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(user_id)
        .bind(&document.date)
        .bind(&document.name)
        .execute(self.db.pool())
        .await
        .context("Failed to store holiday")?;

        info!("Stored holiday '{}' on {} for user {}", document.name, document.date, user_id);
        self.publish(user_id).await;
        Ok(())
    }

    async fn delete_holiday(&self, user_id: &str, date: NaiveDate) -> Result<bool> {
        let _guard = self.collection().lock().await;

        let key = format_date(date);
        let result = sqlx::query("DELETE FROM holidays WHERE user_id = ? AND date = ?")
            .bind(user_id)
            .bind(&key)
            .execute(self.db.pool())
            .await
            .context("Failed to delete holiday")?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }
        info!("Deleted holiday on {} for user {}", key, user_id);
        self.publish(user_id).await;
        Ok(true)
    }

    async fn subscribe_holidays(&self, user_id: &str) -> Result<Subscription<Vec<Holiday>>> {
        let _guard = self.collection().lock().await;
        let current = self.load(user_id).await?;
        Ok(self.collection().feed.subscribe(user_id, current))
    }
}
