//! Notification storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Repository;
use crate::{error::AppResult, models::notification::Notification};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn notifications_insert(
        &self,
        user_id: i32,
        message: &str,
        created_at: DateTime<Utc>,
    ) -> AppResult<Notification>;

    /// A user's notifications, newest first
    async fn notifications_list(&self, user_id: i32) -> AppResult<Vec<Notification>>;

    /// Mark one of the user's notifications read. Returns false when the user
    /// has no notification with that id.
    async fn notifications_mark_read(&self, id: i32, user_id: i32) -> AppResult<bool>;
}

#[async_trait]
impl NotificationStore for Repository {
    async fn notifications_insert(
        &self,
        user_id: i32,
        message: &str,
        created_at: DateTime<Utc>,
    ) -> AppResult<Notification> {
        let row = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, message, is_read, created_at)
            VALUES ($1, $2, FALSE, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(message)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn notifications_list(&self, user_id: i32) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn notifications_mark_read(&self, id: i32, user_id: i32) -> AppResult<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
