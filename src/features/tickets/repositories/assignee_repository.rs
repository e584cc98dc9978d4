use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::tickets::models::TicketAssignee;

#[async_trait]
pub trait TicketAssigneeRepository: Send + Sync {
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Vec<TicketAssignee>>;

    /// Drop every assignee row of the ticket and insert the given set
    async fn replace(&self, ticket_id: Uuid, user_ids: &[Uuid], lead_id: Option<Uuid>)
        -> Result<()>;
}

pub struct PgTicketAssigneeRepository {
    pool: PgPool,
}

impl PgTicketAssigneeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketAssigneeRepository for PgTicketAssigneeRepository {
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Vec<TicketAssignee>> {
        sqlx::query_as::<_, TicketAssignee>(
            r#"
            SELECT ticket_id, user_id, is_lead, created_at
            FROM ticket_assignees
            WHERE ticket_id = $1
            ORDER BY is_lead DESC, created_at
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list ticket assignees: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn replace(
        &self,
        ticket_id: Uuid,
        user_ids: &[Uuid],
        lead_id: Option<Uuid>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin assignee transaction: {:?}", e);
            AppError::Database(e)
        })?;

        sqlx::query("DELETE FROM ticket_assignees WHERE ticket_id = $1")
            .bind(ticket_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to clear ticket assignees: {:?}", e);
                AppError::Database(e)
            })?;

        let now = Utc::now();
        for user_id in user_ids {
            sqlx::query(
                r#"
                INSERT INTO ticket_assignees (ticket_id, user_id, is_lead, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(ticket_id)
            .bind(*user_id)
            .bind(lead_id == Some(*user_id))
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert ticket assignee: {:?}", e);
                AppError::Database(e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit ticket assignees: {:?}", e);
            AppError::Database(e)
        })
    }
}
