use uuid::Uuid;

use crate::core::error::{AppError, Result};

/// A normalized assignee set with its optional lead
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub assignees: Vec<Uuid>,
    pub lead: Option<Uuid>,
}

impl Assignment {
    /// The ticket's `assigned_to_id`: the lead, else the first assignee
    pub fn primary(&self) -> Option<Uuid> {
        self.lead.or_else(|| self.assignees.first().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.assignees.is_empty()
    }
}

/// Dedupe (first occurrence wins), drop nil IDs and reconcile the lead with
/// the set. A lead given without assignees becomes the only assignee.
pub fn normalize_assignees(ids: &[Uuid], lead: Option<Uuid>) -> Result<Assignment> {
    let mut assignees: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !id.is_nil() && !assignees.contains(id) {
            assignees.push(*id);
        }
    }

    match lead {
        Some(lead) if lead.is_nil() => Err(AppError::Validation(
            "Lead must reference a user".into(),
        )),
        Some(lead) if assignees.is_empty() => Ok(Assignment {
            assignees: vec![lead],
            lead: Some(lead),
        }),
        Some(lead) if !assignees.contains(&lead) => Err(AppError::Validation(
            "Lead must be one of the assignees".into(),
        )),
        lead => Ok(Assignment { assignees, lead }),
    }
}
