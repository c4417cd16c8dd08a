//! CSV-backed vacation request collection (`vacation_requests.csv`).
//!
//! ```csv
//! id,startDate,endDate,days,status,requestedOn
//! 0b6f...,2024-12-23,2024-12-27,4,Pending,2024-12-01
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use csv::{Reader, Writer};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use shared::{RequestStatus, VacationRequestDocument};

use super::connection::{temp_path, CsvConnection};
use crate::domain::models::{NewVacationRequest, VacationRequest};
use crate::storage::feed::{LiveCollection, Subscription};
use crate::storage::mappers::RequestMapper;
use crate::storage::traits::RequestStorage;

/// One row of the requests file. The status stays a string so rows with an
/// unknown status survive a rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestRecord {
    id: String,
    start_date: String,
    end_date: String,
    days: u32,
    status: String,
    requested_on: String,
}

impl RequestRecord {
    fn new(id: String, document: VacationRequestDocument) -> Self {
        Self {
            id,
            start_date: document.start_date,
            end_date: document.end_date,
            days: document.days,
            status: document.status.as_str().to_string(),
            requested_on: document.requested_on,
        }
    }

    fn into_domain(self) -> Result<VacationRequest> {
        let status = self.status.parse::<RequestStatus>()?;
        let document = VacationRequestDocument {
            start_date: self.start_date,
            end_date: self.end_date,
            days: self.days,
            status,
            requested_on: self.requested_on,
        };
        RequestMapper::to_domain(self.id, document)
    }
}

#[derive(Clone)]
pub struct RequestRepository {
    connection: CsvConnection,
}

impl RequestRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn collection(&self) -> &LiveCollection<Vec<VacationRequest>> {
        &self.connection.collections().requests
    }

    fn read_records(&self, user_id: &str) -> Result<Vec<RequestRecord>> {
        let path = self.connection.requests_file_path(user_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::from_path(&path).with_context(|| format!("Failed to open {:?}", path))?;
        reader
            .deserialize()
            .collect::<Result<Vec<RequestRecord>, _>>()
            .with_context(|| format!("Failed to parse {:?}", path))
    }

    fn write_records(&self, user_id: &str, records: &[RequestRecord]) -> Result<()> {
        self.connection.ensure_user_directory(user_id)?;
        let path = self.connection.requests_file_path(user_id);
        let temp = temp_path(&path);

        {
            let mut writer = Writer::from_path(&temp).with_context(|| format!("Failed to create {:?}", temp))?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }

        std::fs::rename(&temp, &path).with_context(|| format!("Failed to replace {:?}", path))?;
        debug!("Wrote {} requests to {:?}", records.len(), path);
        Ok(())
    }

    fn load(&self, user_id: &str) -> Result<Vec<VacationRequest>> {
        let requests = self
            .read_records(user_id)?
            .into_iter()
            .filter_map(|record| {
                let id = record.id.clone();
                match record.into_domain() {
                    Ok(request) => Some(request),
                    Err(e) => {
                        warn!("Skipping unreadable request {} for user {}: {:#}", id, user_id, e);
                        None
                    }
                }
            })
            .collect();
        Ok(requests)
    }

    fn publish(&self, user_id: &str) {
        let feed = &self.collection().feed;
        if !feed.is_watched(user_id) {
            return;
        }
        match self.load(user_id) {
            Ok(requests) => feed.publish(user_id, requests),
            Err(e) => warn!("Could not reload requests for user {}: {:#}", user_id, e),
        }
    }
}

#[async_trait]
impl RequestStorage for RequestRepository {
    async fn list_requests(&self, user_id: &str) -> Result<Vec<VacationRequest>> {
        self.load(user_id)
    }

    async fn add_request(&self, user_id: &str, request: &NewVacationRequest) -> Result<VacationRequest> {
        let _guard = self.collection().lock().await;

        let id = uuid::Uuid::new_v4().to_string();
        let mut records = self.read_records(user_id)?;
        records.push(RequestRecord::new(id.clone(), RequestMapper::to_document(request)));
        self.write_records(user_id, &records)?;

        info!("Stored request {} for user {}", id, user_id);
        self.publish(user_id);
        Ok(request.clone().with_id(id))
    }

    async fn update_request_status(&self, user_id: &str, request_id: &str, status: RequestStatus) -> Result<bool> {
        let _guard = self.collection().lock().await;

        let mut records = self.read_records(user_id)?;
        let Some(record) = records.iter_mut().find(|record| record.id == request_id) else {
            return Ok(false);
        };
        record.status = status.as_str().to_string();
        self.write_records(user_id, &records)?;

        info!("Request {} of user {} is now {}", request_id, user_id, status);
        self.publish(user_id);
        Ok(true)
    }

    async fn delete_request(&self, user_id: &str, request_id: &str) -> Result<bool> {
        let _guard = self.collection().lock().await;

        let mut records = self.read_records(user_id)?;
        let before = records.len();
        records.retain(|record| record.id != request_id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_records(user_id, &records)?;

        info!("Deleted request {} for user {}", request_id, user_id);
        self.publish(user_id);
        Ok(true)
    }

    async fn subscribe_requests(&self, user_id: &str) -> Result<Subscription<Vec<VacationRequest>>> {
        let _guard = self.collection().lock().await;
        let current = self.load(user_id)?;
        Ok(self.collection().feed.subscribe(user_id, current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::parse_date;
    use crate::storage::csv::test_utils::TestEnvironment;

    fn new_request(start: &str, end: &str, days: u32) -> NewVacationRequest {
        NewVacationRequest::pending(
            parse_date(start).unwrap(),
            parse_date(end).unwrap(),
            days,
            parse_date("2024-12-01").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_add_and_list_in_insertion_order() -> Result<()> {
        let env = TestEnvironment::new()?;
        let repo = RequestRepository::new(env.connection.clone());

        let first = repo.add_request("user-1", &new_request("2024-12-23", "2024-12-27", 4)).await?;
        let second = repo.add_request("user-1", &new_request("2024-03-04", "2024-03-04", 1)).await?;
        assert_ne!(first.id, second.id);

        let requests = repo.list_requests("user-1").await?;
        assert_eq!(requests, vec![first, second]);
        Ok(())
    }

    #[tokio::test]
    async fn test_users_are_isolated() -> Result<()> {
        let env = TestEnvironment::new()?;
        let repo = RequestRepository::new(env.connection.clone());

        repo.add_request("user-1", &new_request("2024-12-23", "2024-12-27", 4)).await?;
        assert!(repo.list_requests("user-2").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_status_and_delete() -> Result<()> {
        let env = TestEnvironment::new()?;
        let repo = RequestRepository::new(env.connection.clone());
        let stored = repo.add_request("user-1", &new_request("2024-12-23", "2024-12-27", 4)).await?;

        assert!(repo.update_request_status("user-1", &stored.id, RequestStatus::Approved).await?);
        assert!(!repo.update_request_status("user-1", "missing", RequestStatus::Approved).await?);
        assert_eq!(repo.list_requests("user-1").await?[0].status, RequestStatus::Approved);

        assert!(repo.delete_request("user-1", &stored.id).await?);
        assert!(!repo.delete_request("user-1", &stored.id).await?);
        assert!(repo.list_requests("user-1").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_rows_are_skipped_but_kept() -> Result<()> {
        let env = TestEnvironment::new()?;
        let repo = RequestRepository::new(env.connection.clone());
        env.connection.ensure_user_directory("user-1")?;
        std::fs::write(
            env.connection.requests_file_path("user-1"),
            "id,startDate,endDate,days,status,requestedOn\n\
             good,2024-12-23,2024-12-27,4,Approved,2024-12-01\n\
             odd,2024-12-23,2024-12-27,4,Archived,2024-12-01\n",
        )?;

        let requests = repo.list_requests("user-1").await?;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, "good");

        repo.add_request("user-1", &new_request("2025-01-06", "2025-01-06", 1)).await?;
        let contents = std::fs::read_to_string(env.connection.requests_file_path("user-1"))?;
        assert!(contents.contains("Archived"));
        Ok(())
    }

    #[tokio::test]
    async fn test_subscription_receives_snapshots_after_writes() -> Result<()> {
        let env = TestEnvironment::new()?;
        let repo = RequestRepository::new(env.connection.clone());

        let mut subscription = repo.subscribe_requests("user-1").await?;
        assert_eq!(subscription.next().await, Some(Vec::new()));

        let stored = repo.add_request("user-1", &new_request("2024-12-23", "2024-12-27", 4)).await?;
        assert_eq!(subscription.next().await, Some(vec![stored.clone()]));

        repo.delete_request("user-1", &stored.id).await?;
        assert_eq!(subscription.next().await, Some(Vec::new()));
        Ok(())
    }

    #[tokio::test]
    async fn test_repositories_from_one_connection_share_the_feed() -> Result<()> {
        let env = TestEnvironment::new()?;
        let reader = RequestRepository::new(env.connection.clone());
        let writer = RequestRepository::new(env.connection.clone());

        let mut subscription = reader.subscribe_requests("user-1").await?;
        subscription.next().await;

        writer.add_request("user-1", &new_request("2024-12-23", "2024-12-27", 4)).await?;
        assert_eq!(subscription.next().await.map(|r| r.len()), Some(1));
        Ok(())
    }
}
