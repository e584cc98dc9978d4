use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::delays::models::{Delay, DelayFilter, DelayStatus};
use crate::shared::types::{QueryScope, Window};

const DELAY_COLUMNS: &str = r#"
    d.id, d.ticket_id, d.user_id, d.estimated_time, d.actual_time, d.delay_time,
    d.delay_percentage, d.status, d.detected_at, d.created_at, d.updated_at
"#;

#[async_trait]
pub trait DelayRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Delay>>;
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Option<Delay>>;
    async fn create(&self, delay: &Delay) -> Result<Delay>;
    async fn update(&self, delay: &Delay) -> Result<Delay>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn list(
        &self,
        scope: &QueryScope,
        filter: &DelayFilter,
        window: Window,
    ) -> Result<(Vec<Delay>, i64)>;
    async fn count_by_status(&self, scope: &QueryScope) -> Result<Vec<(DelayStatus, i64)>>;
}

pub struct PgDelayRepository {
    pool: PgPool,
}

impl PgDelayRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: &QueryScope) {
    qb.push(" FROM delays d JOIN tickets t ON t.id = d.ticket_id WHERE t.deleted_at IS NULL");

    match scope {
        QueryScope::All => {}
        QueryScope::Filiales(ids) => {
            qb.push(" AND t.filiale_id = ANY(");
            qb.push_bind(ids.clone());
            qb.push(")");
        }
        QueryScope::User(user_id) => {
            qb.push(" AND d.user_id = ");
            qb.push_bind(*user_id);
        }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &DelayFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND d.status = ");
        qb.push_bind(status);
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND d.user_id = ");
        qb.push_bind(user_id);
    }
}

#[async_trait]
impl DelayRepository for PgDelayRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Delay>> {
        let sql = format!("SELECT {} FROM delays d WHERE d.id = $1", DELAY_COLUMNS);

        sqlx::query_as::<_, Delay>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get delay by ID: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Option<Delay>> {
        let sql = format!("SELECT {} FROM delays d WHERE d.ticket_id = $1", DELAY_COLUMNS);

        sqlx::query_as::<_, Delay>(&sql)
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get delay by ticket: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn create(&self, d: &Delay) -> Result<Delay> {
        let sql = format!(
            r#"
            INSERT INTO delays AS d (
                id, ticket_id, user_id, estimated_time, actual_time, delay_time,
                delay_percentage, status, detected_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            DELAY_COLUMNS
        );

        sqlx::query_as::<_, Delay>(&sql)
            .bind(d.id)
            .bind(d.ticket_id)
            .bind(d.user_id)
            .bind(d.estimated_time)
            .bind(d.actual_time)
            .bind(d.delay_time)
            .bind(d.delay_percentage)
            .bind(d.status)
            .bind(d.detected_at)
            .bind(d.created_at)
            .bind(d.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create delay: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn update(&self, d: &Delay) -> Result<Delay> {
        let sql = format!(
            r#"
            UPDATE delays AS d SET
                user_id = $2, estimated_time = $3, actual_time = $4, delay_time = $5,
                delay_percentage = $6, status = $7, updated_at = NOW()
            WHERE d.id = $1
            RETURNING {}
            "#,
            DELAY_COLUMNS
        );

        sqlx::query_as::<_, Delay>(&sql)
            .bind(d.id)
            .bind(d.user_id)
            .bind(d.estimated_time)
            .bind(d.actual_time)
            .bind(d.delay_time)
            .bind(d.delay_percentage)
            .bind(d.status)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update delay: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Delay '{}' not found", d.id)))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM delays WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete delay: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(())
    }

    async fn list(
        &self,
        scope: &QueryScope,
        filter: &DelayFilter,
        window: Window,
    ) -> Result<(Vec<Delay>, i64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_scope(&mut count_qb, scope);
        push_filter(&mut count_qb, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count delays: {:?}", e);
                AppError::Database(e)
            })?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {}", DELAY_COLUMNS));
        push_scope(&mut qb, scope);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY d.detected_at DESC, d.id LIMIT ");
        qb.push_bind(window.limit);
        qb.push(" OFFSET ");
        qb.push_bind(window.offset);

        let delays = qb
            .build_query_as::<Delay>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list delays: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((delays, total))
    }

    async fn count_by_status(&self, scope: &QueryScope) -> Result<Vec<(DelayStatus, i64)>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT d.status, COUNT(*)");
        push_scope(&mut qb, scope);
        qb.push(" GROUP BY d.status");

        qb.build_query_as::<(DelayStatus, i64)>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count delays by status: {:?}", e);
                AppError::Database(e)
            })
    }
}
