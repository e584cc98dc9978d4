use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::features::delays::models::{
    Delay, DelayJustification, DelayStatus, JustificationStatus,
};

/// Request DTO for justifying a delay
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJustificationDto {
    #[validate(length(min = 1, max = 5000, message = "Justification must be 1-5000 characters"))]
    pub justification: String,
}

/// Request DTO for editing a pending justification
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateJustificationDto {
    #[validate(length(min = 1, max = 5000, message = "Justification must be 1-5000 characters"))]
    pub justification: String,
}

/// Reviewer decision on a justification
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ValidateJustificationDto {
    pub validated: bool,

    #[validate(length(max = 2000, message = "Comment must not exceed 2000 characters"))]
    pub comment: Option<String>,
}

/// Response DTO for delay justification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JustificationResponseDto {
    pub id: Uuid,
    pub delay_id: Uuid,
    pub user_id: Uuid,
    pub justification: String,
    pub status: JustificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_by_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DelayJustification> for JustificationResponseDto {
    fn from(j: DelayJustification) -> Self {
        Self {
            id: j.id,
            delay_id: j.delay_id,
            user_id: j.user_id,
            justification: j.justification,
            status: j.status,
            validated_by_id: j.validated_by_id,
            validated_at: j.validated_at,
            validation_comment: j.validation_comment,
            created_at: j.created_at,
            updated_at: j.updated_at,
        }
    }
}

/// Response DTO for delay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayResponseDto {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub estimated_time: i32,
    pub actual_time: i32,
    pub delay_time: i32,
    pub delay_percentage: Decimal,
    pub status: DelayStatus,
    pub detected_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<JustificationResponseDto>,
}

impl DelayResponseDto {
    pub fn new(delay: Delay, justification: Option<DelayJustification>) -> Self {
        Self {
            id: delay.id,
            ticket_id: delay.ticket_id,
            user_id: delay.user_id,
            estimated_time: delay.estimated_time,
            actual_time: delay.actual_time,
            delay_time: delay.delay_time,
            delay_percentage: delay.delay_percentage,
            status: delay.status,
            detected_at: delay.detected_at,
            justification: justification.map(Into::into),
        }
    }
}

impl From<Delay> for DelayResponseDto {
    fn from(delay: Delay) -> Self {
        Self::new(delay, None)
    }
}

/// Delay counts per status
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DelayStatsDto {
    pub total: i64,
    pub unjustified: i64,
    pub pending: i64,
    pub justified: i64,
    pub rejected: i64,
}

impl From<HashMap<DelayStatus, i64>> for DelayStatsDto {
    fn from(counts: HashMap<DelayStatus, i64>) -> Self {
        let get = |status| counts.get(&status).copied().unwrap_or(0);
        let stats = Self {
            total: 0,
            unjustified: get(DelayStatus::Unjustified),
            pending: get(DelayStatus::Pending),
            justified: get(DelayStatus::Justified),
            rejected: get(DelayStatus::Rejected),
        };

        Self {
            total: stats.unjustified + stats.pending + stats.justified + stats.rejected,
            ..stats
        }
    }
}
