use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::tickets::models::TicketComment;

#[async_trait]
pub trait TicketCommentRepository: Send + Sync {
    async fn create(&self, comment: &TicketComment) -> Result<TicketComment>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TicketComment>>;
    async fn find_by_ticket(
        &self,
        ticket_id: Uuid,
        include_internal: bool,
    ) -> Result<Vec<TicketComment>>;
    async fn update(&self, comment: &TicketComment) -> Result<TicketComment>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

pub struct PgTicketCommentRepository {
    pool: PgPool,
}

impl PgTicketCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketCommentRepository for PgTicketCommentRepository {
    async fn create(&self, c: &TicketComment) -> Result<TicketComment> {
        sqlx::query_as::<_, TicketComment>(
            r#"
            INSERT INTO ticket_comments (id, ticket_id, user_id, content, is_internal, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, ticket_id, user_id, content, is_internal, created_at, updated_at
            "#,
        )
        .bind(c.id)
        .bind(c.ticket_id)
        .bind(c.user_id)
        .bind(&c.content)
        .bind(c.is_internal)
        .bind(c.created_at)
        .bind(c.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create ticket comment: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TicketComment>> {
        sqlx::query_as::<_, TicketComment>(
            r#"
            SELECT id, ticket_id, user_id, content, is_internal, created_at, updated_at
            FROM ticket_comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get ticket comment: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn find_by_ticket(
        &self,
        ticket_id: Uuid,
        include_internal: bool,
    ) -> Result<Vec<TicketComment>> {
        sqlx::query_as::<_, TicketComment>(
            r#"
            SELECT id, ticket_id, user_id, content, is_internal, created_at, updated_at
            FROM ticket_comments
            WHERE ticket_id = $1 AND ($2 OR is_internal = FALSE)
            ORDER BY created_at
            "#,
        )
        .bind(ticket_id)
        .bind(include_internal)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list ticket comments: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn update(&self, c: &TicketComment) -> Result<TicketComment> {
        sqlx::query_as::<_, TicketComment>(
            r#"
            UPDATE ticket_comments SET content = $2, is_internal = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, ticket_id, user_id, content, is_internal, created_at, updated_at
            "#,
        )
        .bind(c.id)
        .bind(&c.content)
        .bind(c.is_internal)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update ticket comment: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Comment '{}' not found", c.id)))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM ticket_comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete ticket comment: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(())
    }
}
