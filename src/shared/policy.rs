use uuid::Uuid;

use crate::core::error::{AppError, Result};

/// Capabilities granted to the caller by the (external) permission layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub view_internal_comments: bool,
    pub validate_justifications: bool,
    pub validate_time_entries: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            view_internal_comments: true,
            validate_justifications: true,
            validate_time_entries: true,
        }
    }
}

/// The authenticated caller of a service operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub capabilities: Capabilities,
}

impl Actor {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            capabilities: Capabilities::default(),
        }
    }

    pub fn with_capabilities(user_id: Uuid, capabilities: Capabilities) -> Self {
        Self {
            user_id,
            capabilities,
        }
    }
}

/// What the actor is acting upon, with the relationships the rules need
#[derive(Debug, Clone, Copy)]
pub enum Resource {
    Comment {
        author_id: Uuid,
    },
    CommentThread,
    Delay {
        owner_id: Uuid,
    },
    Justification {
        author_id: Uuid,
    },
    TimeEntry {
        owner_id: Uuid,
    },
    /// A prospective assignee. `restricted_to` carries the assigner's
    /// department when the assigner is bound to it.
    Assignee {
        user_id: Uuid,
        department_id: Option<Uuid>,
        restricted_to: Option<Uuid>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Delete,
    ViewInternal,
    Justify,
    Validate,
    Assign,
}

/// Single point for relationship and capability checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy;

impl AccessPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn authorize(&self, actor: &Actor, resource: &Resource, action: Action) -> Result<()> {
        if self.allows(actor, resource, action) {
            return Ok(());
        }

        tracing::debug!(
            "Access denied: user={}, action={:?}, resource={:?}",
            actor.user_id,
            action,
            resource
        );

        Err(AppError::Forbidden(Self::denial_message(resource, action)))
    }

    pub fn allows(&self, actor: &Actor, resource: &Resource, action: Action) -> bool {
        match (resource, action) {
            (Resource::Comment { author_id }, Action::Edit | Action::Delete) => {
                *author_id == actor.user_id
            }
            (Resource::CommentThread, Action::ViewInternal) => {
                actor.capabilities.view_internal_comments
            }
            (Resource::Delay { owner_id }, Action::Justify) => *owner_id == actor.user_id,
            (Resource::Justification { author_id }, Action::Edit | Action::Delete) => {
                *author_id == actor.user_id
            }
            (Resource::Justification { .. }, Action::Validate) => {
                actor.capabilities.validate_justifications
            }
            (Resource::TimeEntry { owner_id }, Action::Edit | Action::Delete) => {
                *owner_id == actor.user_id
            }
            (Resource::TimeEntry { .. }, Action::Validate) => {
                actor.capabilities.validate_time_entries
            }
            (
                Resource::Assignee {
                    department_id,
                    restricted_to,
                    ..
                },
                Action::Assign,
            ) => match restricted_to {
                Some(dept) => *department_id == Some(*dept),
                None => true,
            },
            _ => false,
        }
    }

    fn denial_message(resource: &Resource, action: Action) -> String {
        match (resource, action) {
            (Resource::Comment { .. }, _) => "Only the author can modify this comment".into(),
            (Resource::CommentThread, _) => "Not allowed to view internal comments".into(),
            (Resource::Delay { .. }, _) => {
                "Only the user responsible for the delay can justify it".into()
            }
            (Resource::Justification { .. }, Action::Validate) => {
                "Not allowed to validate justifications".into()
            }
            (Resource::Justification { .. }, _) => {
                "Only the author can modify this justification".into()
            }
            (Resource::TimeEntry { .. }, Action::Validate) => {
                "Not allowed to validate time entries".into()
            }
            (Resource::TimeEntry { .. }, _) => "Only the owner can modify this time entry".into(),
            (Resource::Assignee { user_id, .. }, _) => format!(
                "Cross-department assignment: user {} is outside the assigner's department",
                user_id
            ),
        }
    }
}
