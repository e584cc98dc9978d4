use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Project task that can receive time entries
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ProjectTask {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub estimated_time: Option<i32>,
    pub actual_time: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
