use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Join row between a ticket and one of its assignees
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TicketAssignee {
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub is_lead: bool,
    pub created_at: DateTime<Utc>,
}
