use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::models::User;

const USER_COLUMNS: &str = r#"
    id, first_name, last_name, email, filiale_id, role_id, department_id,
    is_active, created_at, updated_at
"#;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Active users whose department is an IT department of the given filiale
    async fn find_active_it_users(&self, filiale_id: Uuid) -> Result<Vec<User>>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get user by ID: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_active_it_users(&self, filiale_id: Uuid) -> Result<Vec<User>> {
        let sql = format!(
            r#"
            SELECT {} FROM users
            WHERE is_active = TRUE
              AND deleted_at IS NULL
              AND department_id IN (
                  SELECT d.id FROM departments d
                  WHERE d.is_it_department = TRUE AND d.filiale_id = $1
              )
            ORDER BY last_name, first_name
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(filiale_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list IT users of filiale: {:?}", e);
                AppError::Database(e)
            })
    }
}
