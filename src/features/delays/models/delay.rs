use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Delay status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "delay_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DelayStatus {
    Unjustified,
    Pending,
    Justified,
    Rejected,
}

impl std::fmt::Display for DelayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelayStatus::Unjustified => write!(f, "unjustified"),
            DelayStatus::Pending => write!(f, "pending"),
            DelayStatus::Justified => write!(f, "justified"),
            DelayStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Database model for a ticket overrun (actual time above estimate)
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Delay {
    pub id: Uuid,
    pub ticket_id: Uuid,
    /// User accountable for justifying the overrun
    pub user_id: Uuid,
    pub estimated_time: i32,
    pub actual_time: i32,
    /// Minutes over the estimate
    pub delay_time: i32,
    pub delay_percentage: Decimal,
    pub status: DelayStatus,
    pub detected_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filters accepted by delay listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DelayFilter {
    pub status: Option<DelayStatus>,
    pub user_id: Option<Uuid>,
}
