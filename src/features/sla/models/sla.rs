use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::tickets::models::TicketPriority;

/// SLA compliance status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "sla_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SlaStatus {
    OnTime,
    AtRisk,
    Violated,
}

impl std::fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlaStatus::OnTime => write!(f, "on_time"),
            SlaStatus::AtRisk => write!(f, "at_risk"),
            SlaStatus::Violated => write!(f, "violated"),
        }
    }
}

/// Unit of an SLA target duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Minutes,
    Hours,
    Days,
}

impl DurationUnit {
    /// Unrecognized units count as minutes
    pub fn parse(unit: &str) -> Self {
        match unit.trim().to_ascii_lowercase().as_str() {
            "hours" | "hour" | "h" => DurationUnit::Hours,
            "days" | "day" | "d" => DurationUnit::Days,
            _ => DurationUnit::Minutes,
        }
    }

    pub fn duration(&self, amount: i32) -> Duration {
        let amount = i64::from(amount);
        match self {
            DurationUnit::Minutes => Duration::minutes(amount),
            DurationUnit::Hours => Duration::hours(amount),
            DurationUnit::Days => Duration::days(amount),
        }
    }
}

/// Database model for an SLA rule
#[derive(Debug, Clone, FromRow)]
pub struct SlaRule {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    /// `None` applies to every priority of the category
    pub priority: Option<TicketPriority>,
    pub target_time: i32,
    pub unit: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SlaRule {
    pub fn target_duration(&self) -> Duration {
        DurationUnit::parse(&self.unit).duration(self.target_time)
    }

    /// Fails when the rule's target lies beyond the representable range
    pub fn deadline_from(&self, start: DateTime<Utc>) -> Result<DateTime<Utc>> {
        start
            .checked_add_signed(self.target_duration())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "SLA rule '{}' target of {} {} is out of range",
                    self.name, self.target_time, self.unit
                ))
            })
    }
}

/// Database model for the SLA attached to a ticket
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TicketSla {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub sla_rule_id: Uuid,
    pub target_time: DateTime<Utc>,
    pub status: SlaStatus,
    /// When the ticket was resolved or closed
    pub actual_time: Option<DateTime<Utc>>,
    /// Minutes past the target, set once violated at completion
    pub violation_time: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
