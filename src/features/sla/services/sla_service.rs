use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::sla::models::{SlaRule, SlaStatus, TicketSla};
use crate::features::sla::repositories::{SlaRuleRepository, TicketSlaRepository};
use crate::features::tickets::models::Ticket;
use crate::shared::constants::SLA_AT_RISK_RATIO;

/// Status of a freshly attached SLA
pub fn initial_status(
    created_at: DateTime<Utc>,
    target: DateTime<Utc>,
    now: DateTime<Utc>,
) -> SlaStatus {
    if now > target {
        return SlaStatus::Violated;
    }

    let window = (target - created_at).num_seconds() as f64;
    let remaining = (target - now).num_seconds() as f64;
    if remaining < window * SLA_AT_RISK_RATIO {
        SlaStatus::AtRisk
    } else {
        SlaStatus::OnTime
    }
}

/// Status and violation minutes when the ticket is resolved or closed
pub fn completion_status(target: DateTime<Utc>, now: DateTime<Utc>) -> (SlaStatus, Option<i64>) {
    if now > target {
        (SlaStatus::Violated, Some((now - target).num_minutes()))
    } else {
        (SlaStatus::OnTime, None)
    }
}

/// Attaches SLA targets to tickets and tracks their outcome
pub struct SlaService {
    rules: Arc<dyn SlaRuleRepository>,
    slas: Arc<dyn TicketSlaRepository>,
}

impl SlaService {
    pub fn new(rules: Arc<dyn SlaRuleRepository>, slas: Arc<dyn TicketSlaRepository>) -> Self {
        Self { rules, slas }
    }

    pub async fn get_for_ticket(&self, ticket_id: Uuid) -> Result<Option<TicketSla>> {
        self.slas.find_by_ticket(ticket_id).await
    }

    /// Exact (category, priority) rule first, then the category wildcard
    async fn find_rule(&self, ticket: &Ticket) -> Result<Option<SlaRule>> {
        if let Some(rule) = self
            .rules
            .find_active_rule(&ticket.category, Some(ticket.priority))
            .await?
        {
            return Ok(Some(rule));
        }

        self.rules.find_active_rule(&ticket.category, None).await
    }

    pub async fn attach(&self, ticket: &Ticket) -> Result<Option<TicketSla>> {
        self.attach_at(ticket, Utc::now()).await
    }

    /// Attach the matching SLA rule unless the ticket already has one
    pub async fn attach_at(&self, ticket: &Ticket, now: DateTime<Utc>) -> Result<Option<TicketSla>> {
        if let Some(existing) = self.slas.find_by_ticket(ticket.id).await? {
            return Ok(Some(existing));
        }

        let Some(rule) = self.find_rule(ticket).await? else {
            tracing::debug!(
                "No SLA rule for ticket {} (category={}, priority={})",
                ticket.code,
                ticket.category,
                ticket.priority
            );
            return Ok(None);
        };

        let target = rule.deadline_from(ticket.created_at)?;
        let sla = TicketSla {
            id: Uuid::now_v7(),
            ticket_id: ticket.id,
            sla_rule_id: rule.id,
            target_time: target,
            status: initial_status(ticket.created_at, target, now),
            actual_time: None,
            violation_time: None,
            created_at: now,
            updated_at: now,
        };

        let sla = self.slas.create(&sla).await?;
        tracing::info!(
            "SLA '{}' attached to ticket {}: target={}, status={}",
            rule.name,
            ticket.code,
            sla.target_time,
            sla.status
        );

        Ok(Some(sla))
    }

    pub async fn complete(&self, ticket_id: Uuid) -> Result<Option<TicketSla>> {
        self.complete_at(ticket_id, Utc::now()).await
    }

    /// Settle the ticket's SLA against the completion time
    pub async fn complete_at(
        &self,
        ticket_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<TicketSla>> {
        let Some(mut sla) = self.slas.find_by_ticket(ticket_id).await? else {
            return Ok(None);
        };

        let (status, violation) = completion_status(sla.target_time, now);
        sla.status = status;
        sla.violation_time = violation;
        sla.actual_time = Some(now);

        let sla = self.slas.update(&sla).await?;
        if sla.status == SlaStatus::Violated {
            tracing::warn!(
                "SLA violated for ticket {} by {} minutes",
                ticket_id,
                sla.violation_time.unwrap_or_default()
            );
        }

        Ok(Some(sla))
    }
}
