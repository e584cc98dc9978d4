use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::time_entries::models::ProjectTask;

#[async_trait]
pub trait ProjectTaskRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProjectTask>>;
    async fn update_actual_time(&self, id: Uuid, minutes: i32) -> Result<Option<ProjectTask>>;
}

pub struct PgProjectTaskRepository {
    pool: PgPool,
}

impl PgProjectTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectTaskRepository for PgProjectTaskRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProjectTask>> {
        sqlx::query_as::<_, ProjectTask>(
            r#"
            SELECT id, project_id, title, estimated_time, actual_time, created_at, updated_at
            FROM project_tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get project task by ID: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn update_actual_time(&self, id: Uuid, minutes: i32) -> Result<Option<ProjectTask>> {
        sqlx::query_as::<_, ProjectTask>(
            r#"
            UPDATE project_tasks SET actual_time = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_id, title, estimated_time, actual_time, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(minutes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update project task actual time: {:?}", e);
            AppError::Database(e)
        })
    }
}
