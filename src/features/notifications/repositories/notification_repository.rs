use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::notifications::models::Notification;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<Notification>;
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Notification>>;
}

pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, n: &Notification) -> Result<Notification> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (
                id, user_id, notification_type, title, message, link_url, metadata, is_read, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, notification_type, title, message, link_url, metadata, is_read, created_at
            "#,
        )
        .bind(n.id)
        .bind(n.user_id)
        .bind(n.notification_type)
        .bind(&n.title)
        .bind(&n.message)
        .bind(&n.link_url)
        .bind(&n.metadata)
        .bind(n.is_read)
        .bind(n.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create notification: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, notification_type, title, message, link_url, metadata, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list notifications: {:?}", e);
            AppError::Database(e)
        })
    }
}
