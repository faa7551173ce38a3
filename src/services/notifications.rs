//! Notification emitter and inbox

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{notification::Notification, user::Caller},
    repository::NotificationStore,
    scheduling::Clock,
};

#[derive(Clone)]
pub struct NotificationsService {
    store: Arc<dyn NotificationStore>,
    clock: Arc<dyn Clock>,
}

impl NotificationsService {
    pub fn new(store: Arc<dyn NotificationStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Persist an unread message for a user
    pub async fn notify(&self, user_id: i32, message: &str) -> AppResult<Notification> {
        self.store
            .notifications_insert(user_id, message, self.clock.now())
            .await
    }

    /// Like [`notify`](Self::notify), but failures are only logged. Used after
    /// a booking change has already been committed.
    pub async fn notify_best_effort(&self, user_id: i32, message: &str) {
        if let Err(e) = self.notify(user_id, message).await {
            tracing::warn!("Failed to notify user {}: {}", user_id, e);
        }
    }

    /// The caller's notifications, newest first
    pub async fn list_mine(&self, caller: &Caller) -> AppResult<Vec<Notification>> {
        self.store.notifications_list(caller.user_id).await
    }

    pub async fn mark_read(&self, caller: &Caller, id: i32) -> AppResult<()> {
        if self.store.notifications_mark_read(id, caller.user_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Notification {} not found", id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::enums::Role,
        repository::{memory::MemoryStore, notifications::MockNotificationStore},
        scheduling::FixedClock,
        services::testing::at,
    };

    fn service(store: Arc<dyn NotificationStore>) -> NotificationsService {
        NotificationsService::new(store, Arc::new(FixedClock(at(9, 0))))
    }

    #[tokio::test]
    async fn test_notify_and_mark_read() {
        let notifications = service(Arc::new(MemoryStore::new()));
        let owner = Caller::new(4, vec![Role::Student]);
        let stranger = Caller::new(5, vec![Role::Student]);

        let first = notifications.notify(4, "first").await.unwrap();
        assert!(!first.is_read);
        assert_eq!(first.created_at, at(9, 0));
        notifications.notify(4, "second").await.unwrap();

        let inbox = notifications.list_mine(&owner).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].message, "second");
        assert!(notifications.list_mine(&stranger).await.unwrap().is_empty());

        assert!(matches!(
            notifications.mark_read(&stranger, first.id).await,
            Err(AppError::NotFound(_))
        ));
        notifications.mark_read(&owner, first.id).await.unwrap();
        let inbox = notifications.list_mine(&owner).await.unwrap();
        assert!(inbox.iter().find(|n| n.id == first.id).unwrap().is_read);
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failures() {
        let mut mock = MockNotificationStore::new();
        mock.expect_notifications_insert()
            .times(2)
            .returning(|_, _, _| Err(AppError::Internal("disk full".to_string())));

        let notifications = service(Arc::new(mock));
        assert!(notifications.notify(1, "hello").await.is_err());
        notifications.notify_best_effort(1, "hello").await;
    }
}
