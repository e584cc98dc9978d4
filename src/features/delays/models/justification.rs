use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Justification status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "justification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JustificationStatus {
    Pending,
    Validated,
    Rejected,
}

impl std::fmt::Display for JustificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JustificationStatus::Pending => write!(f, "pending"),
            JustificationStatus::Validated => write!(f, "validated"),
            JustificationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Database model for the explanation submitted against a delay
#[derive(Debug, Clone, FromRow)]
pub struct DelayJustification {
    pub id: Uuid,
    pub delay_id: Uuid,
    pub user_id: Uuid,
    pub justification: String,
    pub status: JustificationStatus,
    pub validated_by_id: Option<Uuid>,
    pub validated_at: Option<DateTime<Utc>>,
    pub validation_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
