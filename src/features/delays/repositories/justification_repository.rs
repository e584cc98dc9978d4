use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::delays::models::DelayJustification;

const JUSTIFICATION_COLUMNS: &str = r#"
    id, delay_id, user_id, justification, status, validated_by_id, validated_at,
    validation_comment, created_at, updated_at
"#;

#[async_trait]
pub trait DelayJustificationRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DelayJustification>>;
    async fn find_by_delay(&self, delay_id: Uuid) -> Result<Option<DelayJustification>>;
    async fn create(&self, justification: &DelayJustification) -> Result<DelayJustification>;
    async fn update(&self, justification: &DelayJustification) -> Result<DelayJustification>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

pub struct PgDelayJustificationRepository {
    pool: PgPool,
}

impl PgDelayJustificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DelayJustificationRepository for PgDelayJustificationRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DelayJustification>> {
        let sql = format!(
            "SELECT {} FROM delay_justifications WHERE id = $1",
            JUSTIFICATION_COLUMNS
        );

        sqlx::query_as::<_, DelayJustification>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get justification by ID: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_by_delay(&self, delay_id: Uuid) -> Result<Option<DelayJustification>> {
        let sql = format!(
            "SELECT {} FROM delay_justifications WHERE delay_id = $1",
            JUSTIFICATION_COLUMNS
        );

        sqlx::query_as::<_, DelayJustification>(&sql)
            .bind(delay_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get justification by delay: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn create(&self, j: &DelayJustification) -> Result<DelayJustification> {
        let sql = format!(
            r#"
            INSERT INTO delay_justifications (
                id, delay_id, user_id, justification, status, validated_by_id, validated_at,
                validation_comment, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            JUSTIFICATION_COLUMNS
        );

        sqlx::query_as::<_, DelayJustification>(&sql)
            .bind(j.id)
            .bind(j.delay_id)
            .bind(j.user_id)
            .bind(&j.justification)
            .bind(j.status)
            .bind(j.validated_by_id)
            .bind(j.validated_at)
            .bind(&j.validation_comment)
            .bind(j.created_at)
            .bind(j.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create justification: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn update(&self, j: &DelayJustification) -> Result<DelayJustification> {
        let sql = format!(
            r#"
            UPDATE delay_justifications SET
                justification = $2, status = $3, validated_by_id = $4, validated_at = $5,
                validation_comment = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            JUSTIFICATION_COLUMNS
        );

        sqlx::query_as::<_, DelayJustification>(&sql)
            .bind(j.id)
            .bind(&j.justification)
            .bind(j.status)
            .bind(j.validated_by_id)
            .bind(j.validated_at)
            .bind(&j.validation_comment)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update justification: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Justification '{}' not found", j.id)))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM delay_justifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete justification: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(())
    }
}
