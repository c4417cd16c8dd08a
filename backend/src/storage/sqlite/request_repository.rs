use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use shared::{RequestStatus, VacationRequestDocument};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::connection::DbConnection;
use crate::domain::models::{NewVacationRequest, VacationRequest};
use crate::storage::feed::{LiveCollection, Subscription};
use crate::storage::mappers::RequestMapper;
use crate::storage::traits::RequestStorage;

/// SQLite vacation request repository
#[derive(Clone)]
pub struct RequestRepository {
    db: DbConnection,
}

impl RequestRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn collection(&self) -> &LiveCollection<Vec<VacationRequest>> {
        &self.db.collections().requests
    }

    async fn load(&self, user_id: &str) -> Result<Vec<VacationRequest>> {
        let rows = sqlx::query(
            r#"
            SELECT id, start_date, end_date, days, status, requested_on
            FROM vacation_requests
            WHERE user_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await
        .context("Failed to query vacation requests")?;

        let requests = rows
            .iter()
            .filter_map(|row| match Self::row_to_request(row) {
                Ok(request) => Some(request),
                Err(e) => {
                    warn!("Skipping unreadable request row for user {}: {:#}", user_id, e);
                    None
                }
            })
            .collect();
        Ok(requests)
    }

    fn row_to_request(row: &SqliteRow) -> Result<VacationRequest> {
        let id: String = row.try_get("id")?;
        let days: i64 = row.try_get("days")?;
        let status: String = row.try_get("status")?;

        let document = VacationRequestDocument {
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            days: u32::try_from(days).with_context(|| format!("invalid day count {} in request {}", days, id))?,
            status: status.parse::<RequestStatus>()?,
            requested_on: row.try_get("requested_on")?,
        };
        RequestMapper::to_domain(id, document)
    }

    async fn publish(&self, user_id: &str) {
        let feed = &self.collection().feed;
        if !feed.is_watched(user_id) {
            return;
        }
        match self.load(user_id).await {
            Ok(requests) => feed.publish(user_id, requests),
            Err(e) => warn!("Could not reload requests for user {}: {:#}", user_id, e),
        }
    }
}

#[async_trait]
impl RequestStorage for RequestRepository {
    async fn list_requests(&self, user_id: &str) -> Result<Vec<VacationRequest>> {
        self.load(user_id).await
    }

    async fn add_request(&self, user_id: &str, request: &NewVacationRequest) -> Result<VacationRequest> {
        let _guard = self.collection().lock().await;

        let id = uuid::Uuid::new_v4().to_string();
        let document = RequestMapper::to_document(request);
        sqlx::query(
            r#"
            INSERT INTO vacation_requests (id, user_id, start_date, end_date, days, status, requested_on)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&document.start_date)
        .bind(&document.end_date)
        .bind(i64::from(document.days))
        .bind(document.status.as_str())
        .bind(&document.requested_on)
        .execute(self.db.pool())
        .await
        .context("Failed to insert vacation request")?;

        info!("Stored request {} for user {}", id, user_id);
        self.publish(user_id).await;
        Ok(request.clone().with_id(id))
    }

    async fn update_request_status(&self, user_id: &str, request_id: &str, status: RequestStatus) -> Result<bool> {
        let _guard = self.collection().lock().await;

        let result = sqlx::query("UPDATE vacation_requests SET status = ? WHERE user_id = ? AND id = ?")
            .bind(status.as_str())
            .bind(user_id)
            .bind(request_id)
            .execute(self.db.pool())
            .await
            .context("Failed to update request status")?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }
        info!("Request {} of user {} is now {}", request_id, user_id, status);
        self.publish(user_id).await;
        Ok(true)
    }

    async fn delete_request(&self, user_id: &str, request_id: &str) -> Result<bool> {
        let _guard = self.collection().lock().await;

        let result = sqlx::query("DELETE FROM vacation_requests WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(request_id)
            .execute(self.db.pool())
            .await
            .context("Failed to delete vacation request")?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }
        info!("Deleted request {} for user {}", request_id, user_id);
        self.publish(user_id).await;
        Ok(true)
    }

    async fn subscribe_requests(&self, user_id: &str) -> Result<Subscription<Vec<VacationRequest>>> {
        let _guard = self.collection().lock().await;
        let current = self.load(user_id).await?;
        Ok(self.collection().feed.subscribe(user_id, current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::parse_date;

    fn new_request(start: &str, end: &str, days: u32) -> NewVacationRequest {
        NewVacationRequest::pending(
            parse_date(start).unwrap(),
            parse_date(end).unwrap(),
            days,
            parse_date("2024-12-01").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_add_list_update_delete() -> Result<()> {
        let db = DbConnection::init_test().await?;
        let repo = RequestRepository::new(db);

        let first = repo.add_request("user-1", &new_request("2024-12-23", "2024-12-27", 4)).await?;
        let second = repo.add_request("user-1", &new_request("2024-03-04", "2024-03-05", 2)).await?;
        assert_eq!(repo.list_requests("user-1").await?, vec![first.clone(), second.clone()]);
        assert!(repo.list_requests("user-2").await?.is_empty());

        assert!(repo.update_request_status("user-1", &first.id, RequestStatus::Rejected).await?);
        assert!(!repo.update_request_status("user-2", &first.id, RequestStatus::Approved).await?);
        assert_eq!(repo.list_requests("user-1").await?[0].status, RequestStatus::Rejected);

        assert!(repo.delete_request("user-1", &second.id).await?);
        assert!(!repo.delete_request("user-1", &second.id).await?);
        assert_eq!(repo.list_requests("user-1").await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_rows_with_unknown_status_are_skipped() -> Result<()> {
        let db = DbConnection::init_test().await?;
        sqlx::query(
            "INSERT INTO vacation_requests (id, user_id, start_date, end_date, days, status, requested_on) \
             VALUES ('odd', 'user-1', '2024-12-23', '2024-12-27', 4, 'Archived', '2024-12-01')",
        )
        .execute(db.pool())
        .await?;

        let repo = RequestRepository::new(db);
        assert!(repo.list_requests("user-1").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_subscription_follows_writes() -> Result<()> {
        let db = DbConnection::init_test().await?;
        let repo = RequestRepository::new(db);

        let mut subscription = repo.subscribe_requests("user-1").await?;
        assert_eq!(subscription.next().await, Some(Vec::new()));

        let stored = repo.add_request("user-1", &new_request("2024-12-23", "2024-12-27", 4)).await?;
        assert_eq!(subscription.next().await, Some(vec![stored.clone()]));

        repo.update_request_status("user-1", &stored.id, RequestStatus::Approved).await?;
        let snapshot = subscription.next().await.unwrap();
        assert_eq!(snapshot[0].status, RequestStatus::Approved);
        Ok(())
    }
}
