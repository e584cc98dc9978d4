use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::time_entries::models::{TimeEntry, TimeEntryFilter};
use crate::shared::types::{QueryScope, Window};

const ENTRY_COLUMNS: &str = r#"
    e.id, e.ticket_id, e.task_id, e.user_id, e.date, e.time_spent, e.description,
    e.validated, e.validated_by_id, e.validated_at, e.created_at, e.updated_at
"#;

#[async_trait]
pub trait TimeEntryRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeEntry>>;
    async fn create(&self, entry: &TimeEntry) -> Result<TimeEntry>;
    async fn update(&self, entry: &TimeEntry) -> Result<TimeEntry>;
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Total minutes logged against a ticket, zero when nothing is logged
    async fn sum_by_ticket(&self, ticket_id: Uuid) -> Result<i64>;
    async fn sum_by_task(&self, task_id: Uuid) -> Result<i64>;

    async fn list(
        &self,
        scope: &QueryScope,
        filter: &TimeEntryFilter,
        window: Window,
    ) -> Result<(Vec<TimeEntry>, i64)>;

    /// Mark every unvalidated entry of the ticket as validated, returns the
    /// number of entries touched
    async fn validate_by_ticket(
        &self,
        ticket_id: Uuid,
        validator_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64>;
}

pub struct PgTimeEntryRepository {
    pool: PgPool,
}

impl PgTimeEntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn sum_where(&self, column: &str, id: Uuid) -> Result<i64> {
        let sql = format!(
            "SELECT COALESCE(SUM(time_spent), 0)::BIGINT FROM time_entries WHERE {} = $1",
            column
        );

        sqlx::query_scalar::<_, i64>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to sum time entries by {}: {:?}", column, e);
                AppError::Database(e)
            })
    }
}

fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    scope: &QueryScope,
    filter: &TimeEntryFilter,
) {
    qb.push(" FROM time_entries e LEFT JOIN tickets t ON t.id = e.ticket_id WHERE t.deleted_at IS NULL");

    match scope {
        QueryScope::All => {}
        QueryScope::Filiales(ids) => {
            qb.push(" AND t.filiale_id = ANY(");
            qb.push_bind(ids.clone());
            qb.push(")");
        }
        QueryScope::User(user_id) => {
            qb.push(" AND e.user_id = ");
            qb.push_bind(*user_id);
        }
    }

    if let Some(ticket_id) = filter.ticket_id {
        qb.push(" AND e.ticket_id = ");
        qb.push_bind(ticket_id);
    }
    if let Some(task_id) = filter.task_id {
        qb.push(" AND e.task_id = ");
        qb.push_bind(task_id);
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND e.user_id = ");
        qb.push_bind(user_id);
    }
    if let Some(validated) = filter.validated {
        qb.push(" AND e.validated = ");
        qb.push_bind(validated);
    }
    if let Some(from) = filter.date_from {
        qb.push(" AND e.date >= ");
        qb.push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND e.date <= ");
        qb.push_bind(to);
    }
}

#[async_trait]
impl TimeEntryRepository for PgTimeEntryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeEntry>> {
        let sql = format!("SELECT {} FROM time_entries e WHERE e.id = $1", ENTRY_COLUMNS);

        sqlx::query_as::<_, TimeEntry>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get time entry by ID: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn create(&self, entry: &TimeEntry) -> Result<TimeEntry> {
        let sql = format!(
            r#"
            INSERT INTO time_entries AS e (
                id, ticket_id, task_id, user_id, date, time_spent, description,
                validated, validated_by_id, validated_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        );

        sqlx::query_as::<_, TimeEntry>(&sql)
            .bind(entry.id)
            .bind(entry.ticket_id)
            .bind(entry.task_id)
            .bind(entry.user_id)
            .bind(entry.date)
            .bind(entry.time_spent)
            .bind(&entry.description)
            .bind(entry.validated)
            .bind(entry.validated_by_id)
            .bind(entry.validated_at)
            .bind(entry.created_at)
            .bind(entry.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create time entry: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn update(&self, entry: &TimeEntry) -> Result<TimeEntry> {
        let sql = format!(
            r#"
            UPDATE time_entries AS e SET
                date = $2, time_spent = $3, description = $4, validated = $5,
                validated_by_id = $6, validated_at = $7, updated_at = NOW()
            WHERE e.id = $1
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        );

        sqlx::query_as::<_, TimeEntry>(&sql)
            .bind(entry.id)
            .bind(entry.date)
            .bind(entry.time_spent)
            .bind(&entry.description)
            .bind(entry.validated)
            .bind(entry.validated_by_id)
            .bind(entry.validated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update time entry: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Time entry '{}' not found", entry.id)))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM time_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete time entry: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(())
    }

    async fn sum_by_ticket(&self, ticket_id: Uuid) -> Result<i64> {
        self.sum_where("ticket_id", ticket_id).await
    }

    async fn sum_by_task(&self, task_id: Uuid) -> Result<i64> {
        self.sum_where("task_id", task_id).await
    }

    async fn list(
        &self,
        scope: &QueryScope,
        filter: &TimeEntryFilter,
        window: Window,
    ) -> Result<(Vec<TimeEntry>, i64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_filters(&mut count_qb, scope, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count time entries: {:?}", e);
                AppError::Database(e)
            })?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {}", ENTRY_COLUMNS));
        push_filters(&mut qb, scope, filter);
        qb.push(" ORDER BY e.date DESC, e.created_at DESC LIMIT ");
        qb.push_bind(window.limit);
        qb.push(" OFFSET ");
        qb.push_bind(window.offset);

        let entries = qb
            .build_query_as::<TimeEntry>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list time entries: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((entries, total))
    }

    async fn validate_by_ticket(
        &self,
        ticket_id: Uuid,
        validator_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE time_entries
            SET validated = TRUE, validated_by_id = $2, validated_at = $3, updated_at = NOW()
            WHERE ticket_id = $1 AND validated = FALSE
            "#,
        )
        .bind(ticket_id)
        .bind(validator_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to validate ticket time entries: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(result.rows_affected())
    }
}
