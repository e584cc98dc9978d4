use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::categories::models::TicketCategory;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_active_by_slug(&self, slug: &str) -> Result<Option<TicketCategory>>;
    async fn list_active(&self) -> Result<Vec<TicketCategory>>;
}

pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_active_by_slug(&self, slug: &str) -> Result<Option<TicketCategory>> {
        sqlx::query_as::<_, TicketCategory>(
            r#"
            SELECT id, slug, name, description, display_order, is_active, created_at, updated_at
            FROM ticket_categories
            WHERE slug = $1 AND is_active = TRUE
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get ticket category by slug: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn list_active(&self) -> Result<Vec<TicketCategory>> {
        sqlx::query_as::<_, TicketCategory>(
            r#"
            SELECT id, slug, name, description, display_order, is_active, created_at, updated_at
            FROM ticket_categories
            WHERE is_active = TRUE
            ORDER BY display_order, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list ticket categories: {:?}", e);
            AppError::Database(e)
        })
    }
}
