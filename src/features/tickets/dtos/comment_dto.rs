use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::features::tickets::models::TicketComment;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentDto {
    #[validate(length(min = 1, max = 10000, message = "Comment must be 1-10000 characters"))]
    pub content: String,

    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCommentDto {
    #[validate(length(min = 1, max = 10000, message = "Comment must be 1-10000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponseDto {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TicketComment> for CommentResponseDto {
    fn from(c: TicketComment) -> Self {
        Self {
            id: c.id,
            ticket_id: c.ticket_id,
            user_id: c.user_id,
            content: c.content,
            is_internal: c.is_internal,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
