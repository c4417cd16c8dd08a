//! YAML-backed settings document (`settings.yaml`).
//!
//! ```yaml
//! availableDays: 22
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use shared::SettingsDocument;

use super::connection::{write_atomically, CsvConnection};
use crate::domain::models::{Settings, SettingsPatch};
use crate::storage::feed::{LiveCollection, Subscription};
use crate::storage::mappers::SettingsMapper;
use crate::storage::traits::SettingsStorage;

#[derive(Clone)]
pub struct SettingsRepository {
    connection: CsvConnection,
}

impl SettingsRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn collection(&self) -> &LiveCollection<Option<Settings>> {
        &self.connection.collections().settings
    }

    fn read_document(&self, user_id: &str) -> Result<Option<SettingsDocument>> {
        let path = self.connection.settings_file_path(user_id);
        if !path.exists() {
            debug!("No settings document for user {}", user_id);
            return Ok(None);
        }

        let yaml = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        let document = serde_yaml::from_str(&yaml).with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(Some(document))
    }

    fn load(&self, user_id: &str) -> Result<Option<Settings>> {
        Ok(self
            .read_document(user_id)?
            .as_ref()
            .and_then(SettingsMapper::to_domain))
    }
}

#[async_trait]
impl SettingsStorage for SettingsRepository {
    async fn get_settings(&self, user_id: &str) -> Result<Option<Settings>> {
        self.load(user_id)
    }

    async fn merge_settings(&self, user_id: &str, patch: &SettingsPatch) -> Result<()> {
        let _guard = self.collection().lock().await;

        let mut document = self.read_document(user_id)?.unwrap_or_default();
        SettingsMapper::merge(&mut document, patch);

        self.connection.ensure_user_directory(user_id)?;
        let yaml = serde_yaml::to_string(&document)?;
        write_atomically(&self.connection.settings_file_path(user_id), yaml.as_bytes())?;
        info!("Saved settings for user {}: {:?}", user_id, document);

        let feed = &self.collection().feed;
        if feed.is_watched(user_id) {
            match self.load(user_id) {
                Ok(settings) => feed.publish(user_id, settings),
                Err(e) => warn!("Could not reload settings for user {}: {:#}", user_id, e),
            }
        }
        Ok(())
    }

    async fn subscribe_settings(&self, user_id: &str) -> Result<Subscription<Option<Settings>>> {
        let _guard = self.collection().lock().await;
        let current = self.load(user_id)?;
        Ok(self.collection().feed.subscribe(user_id, current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;

    #[tokio::test]
    async fn test_missing_document_is_none() -> Result<()> {
        let env = TestEnvironment::new()?;
        let repo = SettingsRepository::new(env.connection.clone());
        assert_eq!(repo.get_settings("user-1").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_merge_creates_and_updates_document() -> Result<()> {
        let env = TestEnvironment::new()?;
        let repo = SettingsRepository::new(env.connection.clone());

        repo.merge_settings("user-1", &SettingsPatch::available_days(25)).await?;
        assert_eq!(repo.get_settings("user-1").await?, Some(Settings { available_days: 25 }));

        repo.merge_settings("user-1", &SettingsPatch::default()).await?;
        assert_eq!(repo.get_settings("user-1").await?, Some(Settings { available_days: 25 }));

        let yaml = std::fs::read_to_string(env.connection.settings_file_path("user-1"))?;
        assert!(yaml.contains("availableDays: 25"));
        Ok(())
    }

    #[tokio::test]
    async fn test_document_without_allotment_is_none() -> Result<()> {
        let env = TestEnvironment::new()?;
        let repo = SettingsRepository::new(env.connection.clone());
        env.connection.ensure_user_directory("user-1")?;
        std::fs::write(env.connection.settings_file_path("user-1"), "{}\n")?;

        assert_eq!(repo.get_settings("user-1").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_subscription_sees_saved_allotment() -> Result<()> {
        let env = TestEnvironment::new()?;
        let repo = SettingsRepository::new(env.connection.clone());

        let mut subscription = repo.subscribe_settings("user-1").await?;
        assert_eq!(subscription.next().await, Some(None));

        repo.merge_settings("user-1", &SettingsPatch::available_days(30)).await?;
        assert_eq!(subscription.next().await, Some(Some(Settings { available_days: 30 })));
        Ok(())
    }
}
