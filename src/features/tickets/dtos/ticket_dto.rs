use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::features::tickets::models::{Ticket, TicketAssignee, TicketPriority, TicketStatus};

/// Request DTO for creating a ticket
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateTicketDto {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 10000, message = "Description must be 1-10000 characters"))]
    pub description: String,

    /// Slug of an active ticket category
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    /// Only honored for provider IT staff
    #[validate(length(max = 100, message = "Source must not exceed 100 characters"))]
    pub source: Option<String>,

    pub priority: Option<TicketPriority>,

    pub requester_id: Option<Uuid>,

    #[validate(length(max = 255, message = "Requester name must not exceed 255 characters"))]
    pub requester_name: Option<String>,

    #[validate(length(max = 255, message = "Requester department must not exceed 255 characters"))]
    pub requester_department: Option<String>,

    pub parent_id: Option<Uuid>,

    #[serde(default)]
    pub assignee_ids: Vec<Uuid>,

    pub lead_id: Option<Uuid>,

    /// Minutes
    #[validate(range(min = 0, message = "Estimated time must not be negative"))]
    pub estimated_time: Option<i32>,

    pub filiale_id: Option<Uuid>,

    pub software_id: Option<Uuid>,
}

/// Request DTO for a partial ticket update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTicketDto {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 10000, message = "Description must be 1-10000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, message = "Category must not be empty"))]
    pub category: Option<String>,

    pub priority: Option<TicketPriority>,

    pub requester_id: Option<Uuid>,

    #[validate(length(max = 255, message = "Requester name must not exceed 255 characters"))]
    pub requester_name: Option<String>,

    #[validate(length(max = 255, message = "Requester department must not exceed 255 characters"))]
    pub requester_department: Option<String>,

    pub parent_id: Option<Uuid>,

    pub assignee_ids: Option<Vec<Uuid>>,

    pub lead_id: Option<Uuid>,

    #[validate(range(min = 0, message = "Estimated time must not be negative"))]
    pub estimated_time: Option<i32>,

    pub software_id: Option<Uuid>,
}

/// Request DTO for (re)assigning a ticket
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignTicketDto {
    #[serde(default)]
    pub assignee_ids: Vec<Uuid>,
    pub lead_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeStatusDto {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeDto {
    pub user_id: Uuid,
    pub is_lead: bool,
}

impl From<TicketAssignee> for AssigneeDto {
    fn from(a: TicketAssignee) -> Self {
        Self {
            user_id: a.user_id,
            is_lead: a.is_lead,
        }
    }
}

/// Response DTO for ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketResponseDto {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub source: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_by_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<Uuid>,
    pub assignees: Vec<AssigneeDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_time: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filiale_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_by_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketResponseDto {
    pub fn new(t: Ticket, assignees: Vec<TicketAssignee>) -> Self {
        Self {
            id: t.id,
            code: t.code,
            title: t.title,
            description: t.description,
            category: t.category,
            source: t.source,
            status: t.status,
            priority: t.priority,
            created_by_id: t.created_by_id,
            requester_id: t.requester_id,
            requester_name: t.requester_name,
            requester_department: t.requester_department,
            parent_id: t.parent_id,
            assigned_to_id: t.assigned_to_id,
            lead_id: t.lead_id,
            assignees: assignees.into_iter().map(Into::into).collect(),
            estimated_time: t.estimated_time,
            actual_time: t.actual_time,
            filiale_id: t.filiale_id,
            software_id: t.software_id,
            validated_by_id: t.validated_by_id,
            validated_at: t.validated_at,
            closed_at: t.closed_at,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}
