use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use sqlx::Row;

use super::connection::DbConnection;
use crate::domain::models::{Settings, SettingsPatch};
use crate::storage::feed::{LiveCollection, Subscription};
use crate::storage::traits::SettingsStorage;

/// SQLite settings repository, one row per user
#[derive(Clone)]
pub struct SettingsRepository {
    db: DbConnection,
}

impl SettingsRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn collection(&self) -> &LiveCollection<Option<Settings>> {
        &self.db.collections().settings
    }

    async fn load(&self, user_id: &str) -> Result<Option<Settings>> {
        let row = sqlx::query("SELECT available_days FROM settings WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await
            .context("Failed to query settings")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let available_days: Option<i64> = row.try_get("available_days")?;
        match available_days {
            Some(days) => {
                let available_days = u32::try_from(days)
                    .with_context(|| format!("invalid allotment {} for user {}", days, user_id))?;
                Ok(Some(Settings { available_days }))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SettingsStorage for SettingsRepository {
    async fn get_settings(&self, user_id: &str) -> Result<Option<Settings>> {
        self.load(user_id).await
    }

    async fn merge_settings(&self, user_id: &str, patch: &SettingsPatch) -> Result<()> {
        let _guard = self.collection().lock().await;

        sqlx::query(
            r#"
            INSERT INTO settings (user_id, available_days)
            VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                available_days = COALESCE(excluded.available_days, settings.available_days)
            "#,
        )
        .bind(user_id)
        .bind(patch.available_days.map(i64::from))
        .execute(self.db.pool())
        .await
        .context("Failed to save settings")?;

        info!("Saved settings for user {}: {:?}", user_id, patch);

        let feed = &self.collection().feed;
        if feed.is_watched(user_id) {
            match self.load(user_id).await {
                Ok(settings) => feed.publish(user_id, settings),
                Err(e) => warn!("Could not reload settings for user {}: {:#}", user_id, e),
            }
        }
        Ok(())
    }

    async fn subscribe_settings(&self, user_id: &str) -> Result<Subscription<Option<Settings>>> {
        let _guard = self.collection().lock().await;
        let current = self.load(user_id).await?;
        Ok(self.collection().feed.subscribe(user_id, current))
    }
}
