use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::tickets::models::{Ticket, TicketFilter};
use crate::shared::constants::TICKET_CODE_PREFIX;
use crate::shared::types::{QueryScope, Window};
use crate::shared::validation::parse_ticket_code;

const TICKET_COLUMNS: &str = r#"
    id, code, title, description, category, source, status, priority,
    created_by_id, requester_id, requester_name, requester_department,
    parent_id, assigned_to_id, lead_id, estimated_time, actual_time,
    filiale_id, software_id, validated_by_id, validated_at, closed_at,
    created_at, updated_at, deleted_at
"#;

#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Live (not soft-deleted) ticket by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>>;

    /// Whether any ticket, deleted ones included, already uses this code
    async fn code_exists(&self, code: &str) -> Result<bool>;

    /// Suggested next sequence for codes of the given year
    async fn next_sequence_number(&self, year: i32) -> Result<i64>;

    async fn create(&self, ticket: &Ticket) -> Result<Ticket>;

    /// Persist every mutable field except `actual_time`, which belongs to the
    /// time entry ledger.
    async fn update(&self, ticket: &Ticket) -> Result<Ticket>;

    async fn update_actual_time(&self, id: Uuid, minutes: i32) -> Result<Option<Ticket>>;

    async fn soft_delete(&self, id: Uuid) -> Result<()>;

    async fn list(
        &self,
        scope: &QueryScope,
        filter: &TicketFilter,
        window: Window,
    ) -> Result<(Vec<Ticket>, i64)>;
}

pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, scope: &QueryScope, filter: &TicketFilter) {
    qb.push(" WHERE t.deleted_at IS NULL");

    match scope {
        QueryScope::All => {}
        QueryScope::Filiales(ids) => {
            qb.push(" AND t.filiale_id = ANY(");
            qb.push_bind(ids.clone());
            qb.push(")");
        }
        QueryScope::User(user_id) => {
            qb.push(" AND (t.created_by_id = ");
            qb.push_bind(*user_id);
            qb.push(" OR t.assigned_to_id = ");
            qb.push_bind(*user_id);
            qb.push(" OR EXISTS (SELECT 1 FROM ticket_assignees a WHERE a.ticket_id = t.id AND a.user_id = ");
            qb.push_bind(*user_id);
            qb.push("))");
        }
    }

    if let Some(status) = filter.status {
        qb.push(" AND t.status = ");
        qb.push_bind(status);
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND t.priority = ");
        qb.push_bind(priority);
    }
    if let Some(category) = &filter.category {
        qb.push(" AND t.category = ");
        qb.push_bind(category.clone());
    }
    if let Some(assigned_to_id) = filter.assigned_to_id {
        qb.push(" AND t.assigned_to_id = ");
        qb.push_bind(assigned_to_id);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        qb.push(" AND (t.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR t.code ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>> {
        let sql = format!(
            "SELECT {} FROM tickets WHERE id = $1 AND deleted_at IS NULL",
            TICKET_COLUMNS
        );

        sqlx::query_as::<_, Ticket>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get ticket by ID: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn code_exists(&self, code: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM tickets WHERE code = $1)")
            .bind(code)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to check ticket code: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn next_sequence_number(&self, year: i32) -> Result<i64> {
        let prefix = format!("{}-{:04}-", TICKET_CODE_PREFIX, year);

        // Longest then greatest code carries the highest sequence
        let latest: Option<String> = sqlx::query_scalar(
            r#"
            SELECT code
            FROM tickets
            WHERE code LIKE $1 || '%'
              AND SUBSTRING(code FROM $2) ~ '^[0-9]+$'
            ORDER BY LENGTH(code) DESC, code DESC
            LIMIT 1
            "#,
        )
        .bind(&prefix)
        .bind(prefix.len() as i32 + 1)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to compute next ticket sequence: {:?}", e);
            AppError::Database(e)
        })?;

        let max = latest
            .as_deref()
            .and_then(parse_ticket_code)
            .filter(|(code_year, _)| *code_year == year)
            .map(|(_, sequence)| sequence);

        Ok(max.unwrap_or(0) + 1)
    }

    async fn create(&self, t: &Ticket) -> Result<Ticket> {
        let sql = format!(
            r#"
            INSERT INTO tickets (
                id, code, title, description, category, source, status, priority,
                created_by_id, requester_id, requester_name, requester_department,
                parent_id, assigned_to_id, lead_id, estimated_time, actual_time,
                filiale_id, software_id, validated_by_id, validated_at, closed_at,
                created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
            )
            RETURNING {}
            "#,
            TICKET_COLUMNS
        );

        sqlx::query_as::<_, Ticket>(&sql)
            .bind(t.id)
            .bind(&t.code)
            .bind(&t.title)
            .bind(&t.description)
            .bind(&t.category)
            .bind(&t.source)
            .bind(t.status)
            .bind(t.priority)
            .bind(t.created_by_id)
            .bind(t.requester_id)
            .bind(&t.requester_name)
            .bind(&t.requester_department)
            .bind(t.parent_id)
            .bind(t.assigned_to_id)
            .bind(t.lead_id)
            .bind(t.estimated_time)
            .bind(t.actual_time)
            .bind(t.filiale_id)
            .bind(t.software_id)
            .bind(t.validated_by_id)
            .bind(t.validated_at)
            .bind(t.closed_at)
            .bind(t.created_at)
            .bind(t.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create ticket: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn update(&self, t: &Ticket) -> Result<Ticket> {
        let sql = format!(
            r#"
            UPDATE tickets SET
                title = $2, description = $3, category = $4, source = $5,
                status = $6, priority = $7, requester_id = $8, requester_name = $9,
                requester_department = $10, parent_id = $11, assigned_to_id = $12,
                lead_id = $13, estimated_time = $14, filiale_id = $15, software_id = $16,
                validated_by_id = $17, validated_at = $18, closed_at = $19,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            TICKET_COLUMNS
        );

        sqlx::query_as::<_, Ticket>(&sql)
            .bind(t.id)
            .bind(&t.title)
            .bind(&t.description)
            .bind(&t.category)
            .bind(&t.source)
            .bind(t.status)
            .bind(t.priority)
            .bind(t.requester_id)
            .bind(&t.requester_name)
            .bind(&t.requester_department)
            .bind(t.parent_id)
            .bind(t.assigned_to_id)
            .bind(t.lead_id)
            .bind(t.estimated_time)
            .bind(t.filiale_id)
            .bind(t.software_id)
            .bind(t.validated_by_id)
            .bind(t.validated_at)
            .bind(t.closed_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update ticket: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", t.id)))
    }

    async fn update_actual_time(&self, id: Uuid, minutes: i32) -> Result<Option<Ticket>> {
        let sql = format!(
            r#"
            UPDATE tickets SET actual_time = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            TICKET_COLUMNS
        );

        sqlx::query_as::<_, Ticket>(&sql)
            .bind(id)
            .bind(minutes)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update ticket actual time: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE tickets SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete ticket: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(())
    }

    async fn list(
        &self,
        scope: &QueryScope,
        filter: &TicketFilter,
        window: Window,
    ) -> Result<(Vec<Ticket>, i64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tickets t");
        push_filters(&mut count_qb, scope, filter);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count tickets: {:?}", e);
                AppError::Database(e)
            })?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM tickets t", TICKET_COLUMNS));
        push_filters(&mut qb, scope, filter);
        qb.push(" ORDER BY t.created_at DESC, t.id LIMIT ");
        qb.push_bind(window.limit);
        qb.push(" OFFSET ");
        qb.push_bind(window.offset);

        let tickets = qb
            .build_query_as::<Ticket>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list tickets: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((tickets, total))
    }
}
