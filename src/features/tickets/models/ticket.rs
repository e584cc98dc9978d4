use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::core::error::AppError;

/// Ticket status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Ouvert,
    EnCours,
    EnAttente,
    Resolu,
    Cloture,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Ouvert => write!(f, "ouvert"),
            TicketStatus::EnCours => write!(f, "en_cours"),
            TicketStatus::EnAttente => write!(f, "en_attente"),
            TicketStatus::Resolu => write!(f, "resolu"),
            TicketStatus::Cloture => write!(f, "cloture"),
        }
    }
}

impl FromStr for TicketStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ouvert" => Ok(TicketStatus::Ouvert),
            "en_cours" => Ok(TicketStatus::EnCours),
            "en_attente" => Ok(TicketStatus::EnAttente),
            "resolu" => Ok(TicketStatus::Resolu),
            "cloture" => Ok(TicketStatus::Cloture),
            other => Err(AppError::Validation(format!(
                "Invalid ticket status '{}'",
                other
            ))),
        }
    }
}

/// Ticket priority enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type)]
#[sqlx(type_name = "ticket_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketPriority::Low => write!(f, "low"),
            TicketPriority::Medium => write!(f, "medium"),
            TicketPriority::High => write!(f, "high"),
            TicketPriority::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for TicketPriority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "low" => Ok(TicketPriority::Low),
            "medium" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            "critical" => Ok(TicketPriority::Critical),
            other => Err(AppError::Validation(format!(
                "Invalid ticket priority '{}'",
                other
            ))),
        }
    }
}

/// Database model for ticket
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub source: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_by_id: Uuid,
    pub requester_id: Option<Uuid>,
    pub requester_name: Option<String>,
    pub requester_department: Option<String>,
    pub parent_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    /// Minutes
    pub estimated_time: Option<i32>,
    /// Minutes, sum of the ticket's time entries
    pub actual_time: Option<i32>,
    pub filiale_id: Option<Uuid>,
    pub software_id: Option<Uuid>,
    pub validated_by_id: Option<Uuid>,
    pub validated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Whom requester-facing notifications go to
    pub fn requester_or_creator(&self) -> Uuid {
        self.requester_id.unwrap_or(self.created_by_id)
    }

    pub fn link(&self) -> String {
        format!("/tickets/{}", self.id)
    }
}

/// Filters accepted by ticket listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub category: Option<String>,
    pub assigned_to_id: Option<Uuid>,
    pub search: Option<String>,
}
