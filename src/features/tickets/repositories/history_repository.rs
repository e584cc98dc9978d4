use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::tickets::models::{NewTicketHistory, TicketHistory};

#[async_trait]
pub trait TicketHistoryRepository: Send + Sync {
    async fn create(&self, entry: &NewTicketHistory) -> Result<TicketHistory>;

    /// Entries of a ticket, oldest first
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Vec<TicketHistory>>;
}

pub struct PgTicketHistoryRepository {
    pool: PgPool,
}

impl PgTicketHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketHistoryRepository for PgTicketHistoryRepository {
    async fn create(&self, entry: &NewTicketHistory) -> Result<TicketHistory> {
        sqlx::query_as::<_, TicketHistory>(
            r#"
            INSERT INTO ticket_histories (
                id, ticket_id, user_id, action, field_name, old_value, new_value, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, ticket_id, user_id, action, field_name, old_value, new_value, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(entry.ticket_id)
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.field_name)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create ticket history: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Vec<TicketHistory>> {
        sqlx::query_as::<_, TicketHistory>(
            r#"
            SELECT id, ticket_id, user_id, action, field_name, old_value, new_value, created_at
            FROM ticket_histories
            WHERE ticket_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list ticket history: {:?}", e);
            AppError::Database(e)
        })
    }
}
