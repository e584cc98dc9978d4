use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::features::time_entries::models::TimeEntry;

/// Request DTO for logging time. Exactly one of `ticket_id` and `task_id`
/// must be set.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTimeEntryDto {
    pub ticket_id: Option<Uuid>,
    pub task_id: Option<Uuid>,

    /// Calendar date, `YYYY-MM-DD`
    #[validate(length(min = 1, message = "Date is required"))]
    pub date: String,

    /// Minutes, negative for an adjustment
    #[validate(range(
        min = -525600,
        max = 525600,
        message = "Time spent must be within one year either way"
    ))]
    pub time_spent: i32,

    #[validate(length(max = 2000, message = "Description must not exceed 2000 characters"))]
    pub description: Option<String>,
}

/// Request DTO for editing a time entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTimeEntryDto {
    pub date: Option<String>,

    #[validate(range(
        min = -525600,
        max = 525600,
        message = "Time spent must be within one year either way"
    ))]
    pub time_spent: Option<i32>,

    #[validate(length(max = 2000, message = "Description must not exceed 2000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateTimeEntryDto {
    pub validated: bool,
}

/// Response DTO for time entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntryResponseDto {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub time_spent: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub validated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_by_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<TimeEntry> for TimeEntryResponseDto {
    fn from(e: TimeEntry) -> Self {
        Self {
            id: e.id,
            ticket_id: e.ticket_id,
            task_id: e.task_id,
            user_id: e.user_id,
            date: e.date,
            time_spent: e.time_spent,
            description: e.description,
            validated: e.validated,
            validated_by_id: e.validated_by_id,
            validated_at: e.validated_at,
            created_at: e.created_at,
        }
    }
}
