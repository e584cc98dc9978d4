use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for time logged against a ticket or a project task
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TimeEntry {
    pub id: Uuid,
    pub ticket_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub user_id: Uuid,
    pub date: NaiveDate,
    /// Minutes; negative values are adjustments
    pub time_spent: i32,
    pub description: Option<String>,
    pub validated: bool,
    pub validated_by_id: Option<Uuid>,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a time entry is booked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryTarget {
    Ticket(Uuid),
    Task(Uuid),
}

impl TimeEntry {
    pub fn target(&self) -> Option<EntryTarget> {
        match (self.ticket_id, self.task_id) {
            (Some(ticket_id), _) => Some(EntryTarget::Ticket(ticket_id)),
            (None, Some(task_id)) => Some(EntryTarget::Task(task_id)),
            (None, None) => None,
        }
    }
}

/// Filters accepted by time entry listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeEntryFilter {
    pub ticket_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub validated: Option<bool>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}
