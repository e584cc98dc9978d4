use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for an append-only ticket history entry
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TicketHistory {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// History entry queued for persistence
#[derive(Debug, Clone, PartialEq)]
pub struct NewTicketHistory {
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewTicketHistory {
    pub fn new(ticket_id: Uuid, user_id: Uuid, action: &str) -> Self {
        Self {
            ticket_id,
            user_id,
            action: action.to_string(),
            field_name: None,
            old_value: None,
            new_value: None,
            created_at: Utc::now(),
        }
    }

    pub fn change(
        mut self,
        field: &str,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        self.field_name = Some(field.to_string());
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }
}
