use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::notifications::models::{Notification, NotificationMessage};
use crate::features::notifications::repositories::NotificationRepository;

/// Delivery of in-app notifications.
///
/// `create` reports failures to the caller; the `notify*` helpers are used as
/// side effects of other operations and only log failures.
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    pub async fn create(&self, user_id: Uuid, message: &NotificationMessage) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::now_v7(),
            user_id,
            notification_type: message.notification_type,
            title: message.title.clone(),
            message: message.message.clone(),
            link_url: message.link_url.clone(),
            metadata: message.metadata.clone(),
            is_read: false,
            created_at: Utc::now(),
        };

        self.notifications.create(&notification).await
    }

    /// Best-effort delivery to a single user
    pub async fn notify(&self, user_id: Uuid, message: &NotificationMessage) {
        if let Err(e) = self.create(user_id, message).await {
            tracing::warn!(
                "Failed to deliver {} notification to user {}: {}",
                message.notification_type,
                user_id,
                e
            );
        }
    }

    /// Best-effort delivery to several users, returns how many were delivered
    pub async fn notify_many(&self, user_ids: &[Uuid], message: &NotificationMessage) -> usize {
        let results = join_all(user_ids.iter().map(|id| self.create(*id, message))).await;

        let mut delivered = 0;
        for (user_id, result) in user_ids.iter().zip(results) {
            match result {
                Ok(_) => delivered += 1,
                Err(e) => tracing::warn!(
                    "Failed to deliver {} notification to user {}: {}",
                    message.notification_type,
                    user_id,
                    e
                ),
            }
        }

        delivered
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        self.notifications.find_by_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::notifications::models::NotificationType;
    use crate::shared::test_helpers::InMemoryStore;

    #[tokio::test]
    async fn test_notify_many_delivers_to_each_user() {
        let store = InMemoryStore::new();
        let service = NotificationService::new(store.clone());
        let users = vec![Uuid::new_v4(), Uuid::new_v4()];
        let message = NotificationMessage::new(
            NotificationType::TicketCreated,
            "New ticket",
            "TKT-2025-0001 was created",
        )
        .link("/tickets/1");

        let delivered = service.notify_many(&users, &message).await;
        assert_eq!(delivered, 2);

        let inbox = service.list_for_user(users[0]).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].notification_type, NotificationType::TicketCreated);
        assert_eq!(inbox[0].link_url.as_deref(), Some("/tickets/1"));
        assert!(!inbox[0].is_read);
    }

    #[tokio::test]
    async fn test_notify_swallows_failures() {
        let store = InMemoryStore::new();
        store.fail_notifications(true).await;
        let service = NotificationService::new(store.clone());
        let message = NotificationMessage::new(NotificationType::TicketValidated, "t", "m");

        // Must not panic nor propagate
        service.notify(Uuid::new_v4(), &message).await;
        assert_eq!(service.notify_many(&[Uuid::new_v4()], &message).await, 0);
    }
}
