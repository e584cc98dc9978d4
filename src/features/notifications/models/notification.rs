use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Notification type enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TicketCreated,
    TicketPendingValidation,
    TicketInvalidated,
    TicketValidated,
    DelayJustificationReviewed,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::TicketCreated => write!(f, "ticket_created"),
            NotificationType::TicketPendingValidation => write!(f, "ticket_pending_validation"),
            NotificationType::TicketInvalidated => write!(f, "ticket_invalidated"),
            NotificationType::TicketValidated => write!(f, "ticket_validated"),
            NotificationType::DelayJustificationReviewed => {
                write!(f, "delay_justification_reviewed")
            }
        }
    }
}

/// Database model for an in-app notification
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub link_url: Option<String>,
    pub metadata: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Content of a notification before it is addressed to a user
#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub link_url: Option<String>,
    pub metadata: serde_json::Value,
}

impl NotificationMessage {
    pub fn new(
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            notification_type,
            title: title.into(),
            message: message.into(),
            link_url: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn link(mut self, url: impl Into<String>) -> Self {
        self.link_url = Some(url.into());
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
