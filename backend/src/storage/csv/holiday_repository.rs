//! CSV-backed holiday collection (`holidays.csv`), one row per date.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use csv::{Reader, Writer};
use log::{debug, info, warn};
use shared::HolidayDocument;

use super::connection::{temp_path, CsvConnection};
use crate::domain::models::{format_date, Holiday};
use crate::storage::feed::{LiveCollection, Subscription};
use crate::storage::mappers::HolidayMapper;
use crate::storage::traits::HolidayStorage;

#[derive(Clone)]
pub struct HolidayRepository {
    connection: CsvConnection,
}

impl HolidayRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn collection(&self) -> &LiveCollection<Vec<Holiday>> {
        &self.connection.collections().holidays
    }

    fn read_documents(&self, user_id: &str) -> Result<Vec<HolidayDocument>> {
        let path = self.connection.holidays_file_path(user_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::from_path(&path).with_context(|| format!("Failed to open {:?}", path))?;
        reader
            .deserialize()
            .collect::<Result<Vec<HolidayDocument>, _>>()
            .with_context(|| format!("Failed to parse {:?}", path))
    }

    fn write_documents(&self, user_id: &str, documents: &[HolidayDocument]) -> Result<()> {
        self.connection.ensure_user_directory(user_id)?;
        let path = self.connection.holidays_file_path(user_id);
        let temp = temp_path(&path);

        {
            let mut writer = Writer::from_path(&temp).with_context(|| format!("Failed to create {:?}", temp))?;
            for document in documents {
                writer.serialize(document)?;
            }
            writer.flush()?;
        }

        std::fs::rename(&temp, &path).with_context(|| format!("Failed to replace {:?}", path))?;
        debug!("Wrote {} holidays to {:?}", documents.len(), path);
        Ok(())
    }

    fn load(&self, user_id: &str) -> Result<Vec<Holiday>> {
        let holidays = self
            .read_documents(user_id)?
            .into_iter()
            .filter_map(|document| {
                let date = document.date.clone();
                match HolidayMapper::to_domain(document) {
                    Ok(holiday) => Some(holiday),
                    Err(e) => {
                        warn!("Skipping unreadable holiday '{}' for user {}: {:#}", date, user_id, e);
                        None
                    }
                }
            })
            .collect();
        Ok(holidays)
    }

    fn publish(&self, user_id: &str) {
        let feed = &self.collection().feed;
        if !feed.is_watched(user_id) {
            return;
        }
        match self.load(user_id) {
            Ok(holidays) => feed.publish(user_id, holidays),
            Err(e) => warn!("Could not reload holidays for user {}: {:#}", user_id, e),
        }
    }
}

#[async_trait]
impl HolidayStorage for HolidayRepository {
    async fn list_holidays(&self, user_id: &str) -> Result<Vec<Holiday>> {
        self.load(user_id)
    }

    async fn put_holiday(&self, user_id: &str, holiday: &Holiday) -> Result<()> {
        let _guard = self.collection().lock().await;

        let key = format_date(holiday.date);
        let mut documents = self.read_documents(user_id)?;
        documents.retain(|document| document.date.trim() != key);
        documents.push(HolidayMapper::to_document(holiday));
        self.write_documents(user_id, &documents)?;

        info!("Stored holiday '{}' on {} for user {}", holiday.name, key, user_id);
        self.publish(user_id);
        Ok(())
    }

    async fn delete_holiday(&self, user_id: &str, date: NaiveDate) -> Result<bool> {
        let _guard = self.collection().lock().await;

        let key = format_date(date);
        let mut documents = self.read_documents(user_id)?;
        let before = documents.len();
        documents.retain(|document| document.date.trim() != key);
        if documents.len() == before {
            return Ok(false);
        }
        self.write_documents(user_id, &documents)?;

        info!("Deleted holiday on {} for user {}", key, user_id);
        self.publish(user_id);
        Ok(true)
    }

    async fn subscribe_holidays(&self, user_id: &str) -> Result<Subscription<Vec<Holiday>>> {
        let _guard = self.collection().lock().await;
        let current = self.load(user_id)?;
        Ok(self.collection().feed.subscribe(user_id, current))
    }
}
