use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::delays::models::{Delay, DelayStatus};
use crate::features::delays::repositories::DelayRepository;
use crate::features::tickets::models::{Ticket, TicketFilter};
use crate::features::tickets::repositories::TicketRepository;
use crate::shared::types::{QueryScope, Window};

/// Largest value a `NUMERIC(5,2)` column holds
fn max_percentage() -> Decimal {
    Decimal::new(99999, 2)
}

/// Overrun relative to the estimate, in percent, rounded to two decimals
pub fn delay_percentage(delay_time: i32, estimated_time: i32) -> Decimal {
    if estimated_time <= 0 {
        return max_percentage();
    }

    let ratio = Decimal::from(delay_time) * Decimal::ONE_HUNDRED / Decimal::from(estimated_time);
    ratio.round_dp(2).min(max_percentage())
}

/// What a ticket's time figures say about its delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    /// Not enough data to judge
    Skip,
    /// Within the estimate
    OnTrack,
    Overrun {
        estimated_time: i32,
        actual_time: i32,
        delay_time: i32,
        delay_percentage: Decimal,
    },
}

pub fn assess(estimated_time: Option<i32>, actual_time: Option<i32>) -> Assessment {
    let (Some(estimated), Some(actual)) = (estimated_time, actual_time) else {
        return Assessment::Skip;
    };
    if estimated <= 0 {
        return Assessment::Skip;
    }

    let delay = i64::from(actual) - i64::from(estimated);
    if delay <= 0 {
        return Assessment::OnTrack;
    }
    let delay = i32::try_from(delay).unwrap_or(i32::MAX);

    Assessment::Overrun {
        estimated_time: estimated,
        actual_time: actual,
        delay_time: delay,
        delay_percentage: delay_percentage(delay, estimated),
    }
}

/// Effect of reconciling one ticket
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Skipped,
    Unchanged,
    Created(Delay),
    Updated(Delay),
    Deleted,
    /// Back within the estimate but the delay is already under review
    Retained(Delay),
}

/// Totals of one full sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub scanned: u64,
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    pub failed: u64,
}

impl SyncReport {
    fn count(&mut self, outcome: &ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Created(_) => self.created += 1,
            ReconcileOutcome::Updated(_) => self.updated += 1,
            ReconcileOutcome::Deleted => self.deleted += 1,
            _ => {}
        }
    }
}

/// Keeps each ticket's Delay record consistent with its estimate and
/// logged time.
pub struct DelayReconciler {
    tickets: Arc<dyn TicketRepository>,
    delays: Arc<dyn DelayRepository>,
}

impl DelayReconciler {
    pub fn new(tickets: Arc<dyn TicketRepository>, delays: Arc<dyn DelayRepository>) -> Self {
        Self { tickets, delays }
    }

    pub async fn reconcile(&self, ticket: &Ticket, actor: Option<Uuid>) -> Result<ReconcileOutcome> {
        self.reconcile_at(ticket, actor, Utc::now()).await
    }

    pub async fn reconcile_at(
        &self,
        ticket: &Ticket,
        actor: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome> {
        let assessment = assess(ticket.estimated_time, ticket.actual_time);
        if assessment == Assessment::Skip {
            return Ok(ReconcileOutcome::Skipped);
        }

        let existing = self.delays.find_by_ticket(ticket.id).await?;

        let Assessment::Overrun {
            estimated_time,
            actual_time,
            delay_time,
            delay_percentage,
        } = assessment
        else {
            return match existing {
                Some(delay) if delay.status == DelayStatus::Unjustified => {
                    self.delays.delete(delay.id).await?;
                    tracing::info!("Delay cleared for ticket {}", ticket.code);
                    Ok(ReconcileOutcome::Deleted)
                }
                Some(delay) => Ok(ReconcileOutcome::Retained(delay)),
                None => Ok(ReconcileOutcome::Unchanged),
            };
        };

        match existing {
            None => {
                let delay = Delay {
                    id: Uuid::now_v7(),
                    ticket_id: ticket.id,
                    user_id: actor
                        .or(ticket.assigned_to_id)
                        .unwrap_or(ticket.created_by_id),
                    estimated_time,
                    actual_time,
                    delay_time,
                    delay_percentage,
                    status: DelayStatus::Unjustified,
                    detected_at: now,
                    created_at: now,
                    updated_at: now,
                };

                let delay = self.delays.create(&delay).await?;
                tracing::info!(
                    "Delay detected on ticket {}: {} minutes ({}%)",
                    ticket.code,
                    delay.delay_time,
                    delay.delay_percentage
                );
                Ok(ReconcileOutcome::Created(delay))
            }
            Some(mut delay) => {
                let status = match delay.status {
                    DelayStatus::Rejected => DelayStatus::Unjustified,
                    other => other,
                };

                if delay.estimated_time == estimated_time
                    && delay.actual_time == actual_time
                    && delay.delay_time == delay_time
                    && delay.delay_percentage == delay_percentage
                    && delay.status == status
                {
                    return Ok(ReconcileOutcome::Unchanged);
                }

                delay.estimated_time = estimated_time;
                delay.actual_time = actual_time;
                delay.delay_time = delay_time;
                delay.delay_percentage = delay_percentage;
                delay.status = status;

                let delay = self.delays.update(&delay).await?;
                tracing::debug!(
                    "Delay refreshed for ticket {}: {} minutes, status={}",
                    ticket.code,
                    delay.delay_time,
                    delay.status
                );
                Ok(ReconcileOutcome::Updated(delay))
            }
        }
    }

    /// Reconcile every live ticket, page by page. Per-ticket failures are
    /// logged and counted; only a failing page fetch aborts the sweep.
    pub async fn sync_all(&self, page_size: i64) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        let filter = TicketFilter::default();
        let limit = page_size.max(1);
        let mut offset = 0;

        loop {
            let (tickets, _) = self
                .tickets
                .list(&QueryScope::All, &filter, Window { offset, limit })
                .await?;
            if tickets.is_empty() {
                break;
            }

            for ticket in &tickets {
                report.scanned += 1;
                match self.reconcile(ticket, None).await {
                    Ok(outcome) => report.count(&outcome),
                    Err(e) => {
                        report.failed += 1;
                        tracing::error!("Failed to reconcile delay for ticket {}: {:?}", ticket.code, e);
                    }
                }
            }

            if (tickets.len() as i64) < limit {
                break;
            }
            offset += limit;
        }

        Ok(report)
    }
}
