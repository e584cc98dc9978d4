use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::sla::models::{SlaRule, TicketSla};
use crate::features::tickets::models::TicketPriority;

#[async_trait]
pub trait SlaRuleRepository: Send + Sync {
    /// Active rule for the category and priority; `None` priority matches
    /// only wildcard rules.
    async fn find_active_rule(
        &self,
        category: &str,
        priority: Option<TicketPriority>,
    ) -> Result<Option<SlaRule>>;
}

#[async_trait]
pub trait TicketSlaRepository: Send + Sync {
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Option<TicketSla>>;
    async fn create(&self, sla: &TicketSla) -> Result<TicketSla>;
    async fn update(&self, sla: &TicketSla) -> Result<TicketSla>;
}

pub struct PgSlaRepository {
    pool: PgPool,
}

impl PgSlaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlaRuleRepository for PgSlaRepository {
    async fn find_active_rule(
        &self,
        category: &str,
        priority: Option<TicketPriority>,
    ) -> Result<Option<SlaRule>> {
        sqlx::query_as::<_, SlaRule>(
            r#"
            SELECT id, name, category, priority, target_time, unit, is_active, created_at, updated_at
            FROM sla_rules
            WHERE category = $1
              AND priority IS NOT DISTINCT FROM $2
              AND is_active = TRUE
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(category)
        .bind(priority)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to find SLA rule: {:?}", e);
            AppError::Database(e)
        })
    }
}

#[async_trait]
impl TicketSlaRepository for PgSlaRepository {
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Option<TicketSla>> {
        sqlx::query_as::<_, TicketSla>(
            r#"
            SELECT id, ticket_id, sla_rule_id, target_time, status, actual_time, violation_time,
                   created_at, updated_at
            FROM ticket_slas
            WHERE ticket_id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get ticket SLA: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn create(&self, s: &TicketSla) -> Result<TicketSla> {
        sqlx::query_as::<_, TicketSla>(
            r#"
            INSERT INTO ticket_slas (
                id, ticket_id, sla_rule_id, target_time, status, actual_time, violation_time,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, ticket_id, sla_rule_id, target_time, status, actual_time, violation_time,
                      created_at, updated_at
            "#,
        )
        .bind(s.id)
        .bind(s.ticket_id)
        .bind(s.sla_rule_id)
        .bind(s.target_time)
        .bind(s.status)
        .bind(s.actual_time)
        .bind(s.violation_time)
        .bind(s.created_at)
        .bind(s.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create ticket SLA: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn update(&self, s: &TicketSla) -> Result<TicketSla> {
        sqlx::query_as::<_, TicketSla>(
            r#"
            UPDATE ticket_slas
            SET status = $2, actual_time = $3, violation_time = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, ticket_id, sla_rule_id, target_time, status, actual_time, violation_time,
                      created_at, updated_at
            "#,
        )
        .bind(s.id)
        .bind(s.status)
        .bind(s.actual_time)
        .bind(s.violation_time)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update ticket SLA: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Ticket SLA '{}' not found", s.id)))
    }
}
