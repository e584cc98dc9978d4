use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::models::{Department, Filiale, Role};

/// Read access to the organizational hierarchy (filiale, department, role)
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn find_filiale(&self, id: Uuid) -> Result<Option<Filiale>>;
    async fn find_department(&self, id: Uuid) -> Result<Option<Department>>;
    async fn find_role(&self, id: Uuid) -> Result<Option<Role>>;

    /// The filiale flagged as software provider, if one is configured
    async fn find_software_provider(&self) -> Result<Option<Filiale>>;
}

pub struct PgOrganizationRepository {
    pool: PgPool,
}

impl PgOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn find_filiale(&self, id: Uuid) -> Result<Option<Filiale>> {
        sqlx::query_as::<_, Filiale>(
            r#"
            SELECT id, code, name, is_software_provider, is_active
            FROM filiales
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get filiale by ID: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn find_department(&self, id: Uuid) -> Result<Option<Department>> {
        sqlx::query_as::<_, Department>(
            r#"
            SELECT id, name, filiale_id, is_it_department
            FROM departments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get department by ID: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn find_role(&self, id: Uuid) -> Result<Option<Role>> {
        sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, filiale_id
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get role by ID: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn find_software_provider(&self) -> Result<Option<Filiale>> {
        sqlx::query_as::<_, Filiale>(
            r#"
            SELECT id, code, name, is_software_provider, is_active
            FROM filiales
            WHERE is_software_provider = TRUE AND is_active = TRUE
            ORDER BY code
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get software provider filiale: {:?}", e);
            AppError::Database(e)
        })
    }
}
