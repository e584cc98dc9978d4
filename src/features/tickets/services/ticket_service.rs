use std::fmt::Display;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::core::config::TicketConfig;
use crate::core::error::{AppError, Result};
use crate::core::repositories::Repositories;
use crate::features::categories::CategoryService;
use crate::features::delays::DelayReconciler;
use crate::features::notifications::models::{NotificationMessage, NotificationType};
use crate::features::notifications::NotificationService;
use crate::features::sla::SlaService;
use crate::features::tickets::dtos::{
    AssignTicketDto, CreateTicketDto, TicketResponseDto, UpdateTicketDto,
};
use crate::features::tickets::models::{
    NewTicketHistory, Ticket, TicketFilter, TicketHistory, TicketStatus,
};
use crate::features::tickets::repositories::{
    TicketAssigneeRepository, TicketHistoryRepository, TicketRepository,
};
use crate::features::tickets::services::assignment::{normalize_assignees, Assignment};
use crate::features::tickets::services::code_generator::CodeGenerator;
use crate::features::tickets::workers::HistoryWriter;
use crate::features::time_entries::repositories::TimeEntryRepository;
use crate::features::users::models::OrgProfile;
use crate::features::users::DirectoryService;
use crate::shared::constants::{
    HISTORY_ASSIGNED, HISTORY_CREATED, HISTORY_DELETED, HISTORY_STATUS_CHANGED, HISTORY_UPDATED,
    HISTORY_VALIDATED,
};
use crate::shared::policy::{AccessPolicy, Action, Actor, Resource};
use crate::shared::types::{Page, PaginationQuery, QueryScope, Window};
use crate::shared::validation::require_id;

fn user_ref(id: Option<Uuid>) -> Option<String> {
    id.map(|id| format!("user#{}", id))
}

/// Field-level changes collected during an update, recorded as history once
/// the ticket is persisted.
struct ChangeSet {
    ticket_id: Uuid,
    user_id: Uuid,
    entries: Vec<NewTicketHistory>,
}

impl ChangeSet {
    fn new(ticket_id: Uuid, user_id: Uuid) -> Self {
        Self {
            ticket_id,
            user_id,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, field: &str, old: Option<String>, new: Option<String>) {
        self.entries.push(
            NewTicketHistory::new(self.ticket_id, self.user_id, HISTORY_UPDATED)
                .change(field, old, new),
        );
    }

    fn set<T: PartialEq + Display>(&mut self, field: &str, slot: &mut T, value: T) {
        if *slot != value {
            self.push(field, Some(slot.to_string()), Some(value.to_string()));
            *slot = value;
        }
    }

    fn set_opt<T: PartialEq + Display>(&mut self, field: &str, slot: &mut Option<T>, value: Option<T>) {
        if *slot != value {
            self.push(
                field,
                slot.as_ref().map(ToString::to_string),
                value.as_ref().map(ToString::to_string),
            );
            *slot = value;
        }
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touched(&self, field: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.field_name.as_deref() == Some(field))
    }
}

/// Ticket lifecycle: creation, edits, assignment, status transitions,
/// validation and closure.
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    assignees: Arc<dyn TicketAssigneeRepository>,
    histories: Arc<dyn TicketHistoryRepository>,
    time_entries: Arc<dyn TimeEntryRepository>,
    history: HistoryWriter,
    directory: DirectoryService,
    categories: CategoryService,
    sla: SlaService,
    notifications: Arc<NotificationService>,
    reconciler: Arc<DelayReconciler>,
    codes: CodeGenerator,
    self_service_source: String,
    policy: AccessPolicy,
}

impl TicketService {
    pub fn new(
        repos: &Repositories,
        history: HistoryWriter,
        notifications: Arc<NotificationService>,
        reconciler: Arc<DelayReconciler>,
        config: &TicketConfig,
    ) -> Self {
        Self {
            tickets: repos.tickets.clone(),
            assignees: repos.assignees.clone(),
            histories: repos.histories.clone(),
            time_entries: repos.time_entries.clone(),
            history,
            directory: DirectoryService::new(repos.users.clone(), repos.organization.clone()),
            categories: CategoryService::new(repos.categories.clone()),
            sla: SlaService::new(repos.sla_rules.clone(), repos.ticket_slas.clone()),
            notifications,
            reconciler,
            codes: CodeGenerator::new(repos.tickets.clone(), config.code_max_attempts),
            self_service_source: config.self_service_source.clone(),
            policy: AccessPolicy::new(),
        }
    }

    async fn require_ticket(&self, id: Uuid) -> Result<Ticket> {
        self.tickets
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", id)))
    }

    async fn to_response(&self, ticket: Ticket) -> Result<TicketResponseDto> {
        let assignees = self.assignees.find_by_ticket(ticket.id).await?;
        Ok(TicketResponseDto::new(ticket, assignees))
    }

    /// Every assignee must exist; provider IT staff may only assign within
    /// their own department.
    async fn check_assignees(&self, actor: &Actor, profile: &OrgProfile, assignment: &Assignment) -> Result<()> {
        let restricted_to = if profile.is_provider_it {
            profile.department_id
        } else {
            None
        };

        for user_id in &assignment.assignees {
            let user = self.directory.require_user(*user_id).await?;
            self.policy.authorize(
                actor,
                &Resource::Assignee {
                    user_id: user.id,
                    department_id: user.department_id,
                    restricted_to,
                },
                Action::Assign,
            )?;
        }

        Ok(())
    }

    async fn actor_profile(&self, actor: &Actor) -> Result<OrgProfile> {
        let user = self.directory.require_user(actor.user_id).await?;
        self.directory.profile(&user).await
    }

    async fn require_parent(&self, parent_id: Uuid) -> Result<Ticket> {
        let parent_id = require_id("parent_id", parent_id)?;
        self.tickets
            .find_by_id(parent_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Parent ticket '{}' not found", parent_id)))
    }

    fn message(ticket: &Ticket, kind: NotificationType, title: &str, body: String) -> NotificationMessage {
        NotificationMessage::new(kind, title, body)
            .link(ticket.link())
            .metadata(json!({
                "ticket_id": ticket.id,
                "code": ticket.code,
                "status": ticket.status,
            }))
    }

    /// Best-effort fan-out to the software provider's IT staff
    async fn notify_provider_it(&self, message: &NotificationMessage) {
        match self.directory.provider_it_user_ids().await {
            Ok(ids) if !ids.is_empty() => {
                let delivered = self.notifications.notify_many(&ids, message).await;
                tracing::debug!(
                    "{} notification delivered to {}/{} provider IT users",
                    message.notification_type,
                    delivered,
                    ids.len()
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to resolve provider IT users: {}", e),
        }
    }

    pub async fn create(&self, dto: CreateTicketDto, actor: &Actor) -> Result<TicketResponseDto> {
        dto.validate()?;

        let creator = self.directory.require_user(actor.user_id).await?;
        let profile = self.directory.profile(&creator).await?;
        let filiale_id = dto.filiale_id.or(profile.filiale_id);

        let category = self.categories.require_active(&dto.category).await?;

        let assignment = normalize_assignees(&dto.assignee_ids, dto.lead_id)?;
        self.check_assignees(actor, &profile, &assignment).await?;

        if let Some(parent_id) = dto.parent_id {
            self.require_parent(parent_id).await?;
        }

        let (requester_id, requester_name) = match dto.requester_id {
            Some(id) => {
                let requester = self.directory.require_user(id).await?;
                (Some(requester.id), Some(requester.full_name()))
            }
            None => (None, dto.requester_name.clone()),
        };

        let source = if profile.is_provider_it {
            dto.source
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(self.self_service_source.as_str())
                .to_string()
        } else {
            self.self_service_source.clone()
        };

        let now = Utc::now();
        let code = self.codes.generate(now.year()).await?;

        let ticket = Ticket {
            id: Uuid::now_v7(),
            code,
            title: dto.title.trim().to_string(),
            description: dto.description.trim().to_string(),
            category: category.slug,
            source,
            status: TicketStatus::Ouvert,
            priority: dto.priority.unwrap_or_default(),
            created_by_id: creator.id,
            requester_id,
            requester_name,
            requester_department: dto.requester_department,
            parent_id: dto.parent_id,
            assigned_to_id: assignment.primary(),
            lead_id: assignment.lead,
            estimated_time: dto.estimated_time,
            actual_time: None,
            filiale_id,
            software_id: dto.software_id,
            validated_by_id: None,
            validated_at: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let ticket = self.tickets.create(&ticket).await?;
        if !assignment.is_empty() {
            self.assignees
                .replace(ticket.id, &assignment.assignees, assignment.lead)
                .await?;
        }

        tracing::info!(
            "Ticket created: id={}, code={}, creator={}",
            ticket.id,
            ticket.code,
            creator.id
        );

        self.history
            .record(NewTicketHistory::new(ticket.id, actor.user_id, HISTORY_CREATED));

        if let Err(e) = self.sla.attach(&ticket).await {
            tracing::error!("Failed to attach SLA to ticket {}: {:?}", ticket.code, e);
        }

        let message = Self::message(
            &ticket,
            NotificationType::TicketCreated,
            "New ticket",
            format!("Ticket {} was created: {}", ticket.code, ticket.title),
        );
        self.notify_provider_it(&message).await;

        self.to_response(ticket).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateTicketDto,
        actor: &Actor,
    ) -> Result<TicketResponseDto> {
        dto.validate()?;

        let mut ticket = self.require_ticket(id).await?;
        let mut changes = ChangeSet::new(ticket.id, actor.user_id);

        if let Some(title) = dto.title {
            changes.set("title", &mut ticket.title, title.trim().to_string());
        }
        if let Some(description) = dto.description {
            changes.set("description", &mut ticket.description, description.trim().to_string());
        }
        if let Some(slug) = dto.category {
            let category = self.categories.require_active(&slug).await?;
            changes.set("category", &mut ticket.category, category.slug);
        }
        if let Some(priority) = dto.priority {
            changes.set("priority", &mut ticket.priority, priority);
        }

        match (dto.requester_id, dto.requester_name) {
            (Some(requester_id), _) => {
                let requester = self.directory.require_user(requester_id).await?;
                changes.set_opt("requester_id", &mut ticket.requester_id, Some(requester.id));
                changes.set_opt(
                    "requester_name",
                    &mut ticket.requester_name,
                    Some(requester.full_name()),
                );
            }
            (None, Some(name)) => {
                changes.set_opt("requester_id", &mut ticket.requester_id, None);
                changes.set_opt("requester_name", &mut ticket.requester_name, Some(name));
            }
            (None, None) => {}
        }
        if let Some(department) = dto.requester_department {
            changes.set_opt(
                "requester_department",
                &mut ticket.requester_department,
                Some(department),
            );
        }

        if let Some(parent_id) = dto.parent_id {
            if parent_id == ticket.id {
                return Err(AppError::Validation(
                    "A ticket cannot be its own parent".into(),
                ));
            }
            self.require_parent(parent_id).await?;
            changes.set_opt("parent_id", &mut ticket.parent_id, Some(parent_id));
        }

        let mut new_assignment = None;
        if dto.assignee_ids.is_some() || dto.lead_id.is_some() {
            let ids = match dto.assignee_ids {
                Some(ids) => ids,
                None => self
                    .assignees
                    .find_by_ticket(ticket.id)
                    .await?
                    .into_iter()
                    .map(|a| a.user_id)
                    .collect(),
            };
            let assignment = normalize_assignees(&ids, dto.lead_id)?;
            let profile = self.actor_profile(actor).await?;
            self.check_assignees(actor, &profile, &assignment).await?;

            let old = ticket.assigned_to_id;
            ticket.assigned_to_id = assignment.primary();
            ticket.lead_id = assignment.lead;
            if old != ticket.assigned_to_id {
                changes.push("assigned_to_id", user_ref(old), user_ref(ticket.assigned_to_id));
            }
            new_assignment = Some(assignment);
        }

        if let Some(estimated) = dto.estimated_time {
            changes.set_opt("estimated_time", &mut ticket.estimated_time, Some(estimated));
        }
        if let Some(software_id) = dto.software_id {
            changes.set_opt("software_id", &mut ticket.software_id, Some(software_id));
        }

        if changes.is_empty() && new_assignment.is_none() {
            return self.to_response(ticket).await;
        }

        let ticket = self.tickets.update(&ticket).await?;
        if let Some(assignment) = &new_assignment {
            self.assignees
                .replace(ticket.id, &assignment.assignees, assignment.lead)
                .await?;
        }

        let estimate_changed = changes.touched("estimated_time");
        for entry in changes.entries {
            self.history.record(entry);
        }

        if estimate_changed {
            self.reconciler.reconcile(&ticket, Some(actor.user_id)).await?;
        }

        self.to_response(ticket).await
    }

    pub async fn assign(
        &self,
        id: Uuid,
        dto: AssignTicketDto,
        actor: &Actor,
    ) -> Result<TicketResponseDto> {
        let mut ticket = self.require_ticket(id).await?;

        let assignment = normalize_assignees(&dto.assignee_ids, dto.lead_id)?;
        if assignment.is_empty() {
            return Err(AppError::Validation(
                "At least one assignee is required".into(),
            ));
        }
        let profile = self.actor_profile(actor).await?;
        self.check_assignees(actor, &profile, &assignment).await?;

        let mut entries = Vec::new();
        if ticket.status == TicketStatus::Ouvert {
            ticket.status = TicketStatus::EnCours;
            entries.push(
                NewTicketHistory::new(ticket.id, actor.user_id, HISTORY_STATUS_CHANGED).change(
                    "status",
                    Some(TicketStatus::Ouvert.to_string()),
                    Some(TicketStatus::EnCours.to_string()),
                ),
            );
        }

        let old = ticket.assigned_to_id;
        ticket.assigned_to_id = assignment.primary();
        ticket.lead_id = assignment.lead;
        entries.push(
            NewTicketHistory::new(ticket.id, actor.user_id, HISTORY_ASSIGNED).change(
                "assigned_to_id",
                user_ref(old),
                user_ref(ticket.assigned_to_id),
            ),
        );

        let ticket = self.tickets.update(&ticket).await?;
        self.assignees
            .replace(ticket.id, &assignment.assignees, assignment.lead)
            .await?;

        for entry in entries {
            self.history.record(entry);
        }

        tracing::info!(
            "Ticket {} assigned to {} user(s), primary={:?}",
            ticket.code,
            assignment.assignees.len(),
            ticket.assigned_to_id
        );

        self.to_response(ticket).await
    }

    /// Apply a status transition and its side effects. Returns the ticket
    /// and whether anything changed.
    async fn transition(
        &self,
        id: Uuid,
        status: TicketStatus,
        actor: &Actor,
    ) -> Result<(Ticket, bool)> {
        let mut ticket = self.require_ticket(id).await?;
        let previous = ticket.status;
        if previous == status {
            return Ok((ticket, false));
        }

        ticket.status = status;
        if status == TicketStatus::Cloture && ticket.closed_at.is_none() {
            ticket.closed_at = Some(Utc::now());
        }

        let ticket = self.tickets.update(&ticket).await?;
        self.history.record(
            NewTicketHistory::new(ticket.id, actor.user_id, HISTORY_STATUS_CHANGED).change(
                "status",
                Some(previous.to_string()),
                Some(status.to_string()),
            ),
        );

        tracing::info!("Ticket {} status: {} -> {}", ticket.code, previous, status);

        if status == TicketStatus::EnAttente {
            let message = Self::message(
                &ticket,
                NotificationType::TicketPendingValidation,
                "Ticket awaiting your validation",
                format!("Ticket {} is waiting for your validation", ticket.code),
            );
            self.notifications
                .notify(ticket.requester_or_creator(), &message)
                .await;
        }

        if previous == TicketStatus::Resolu && status != TicketStatus::Cloture {
            let message = Self::message(
                &ticket,
                NotificationType::TicketInvalidated,
                "Ticket reopened",
                format!("Ticket {} was reopened after resolution ({})", ticket.code, status),
            );
            self.notify_provider_it(&message).await;
        }

        Ok((ticket, true))
    }

    pub async fn change_status(
        &self,
        id: Uuid,
        status: &str,
        actor: &Actor,
    ) -> Result<TicketResponseDto> {
        let status: TicketStatus = status.parse()?;
        let (ticket, _) = self.transition(id, status, actor).await?;
        self.to_response(ticket).await
    }

    /// Requester-side validation of a ticket waiting in `en_attente`
    pub async fn validate_ticket(&self, id: Uuid, actor: &Actor) -> Result<TicketResponseDto> {
        let mut ticket = self.require_ticket(id).await?;
        if ticket.status != TicketStatus::EnAttente {
            return Err(AppError::Conflict(format!(
                "Ticket {} is not awaiting validation (status: {})",
                ticket.code, ticket.status
            )));
        }

        let now = Utc::now();
        let previous = ticket.status;
        ticket.status = TicketStatus::Resolu;
        ticket.validated_by_id = Some(actor.user_id);
        ticket.validated_at = Some(now);

        let ticket = self.tickets.update(&ticket).await?;

        self.history.record(
            NewTicketHistory::new(ticket.id, actor.user_id, HISTORY_VALIDATED).change(
                "validated_by_id",
                None,
                user_ref(Some(actor.user_id)),
            ),
        );
        self.history.record(
            NewTicketHistory::new(ticket.id, actor.user_id, HISTORY_STATUS_CHANGED).change(
                "status",
                Some(previous.to_string()),
                Some(ticket.status.to_string()),
            ),
        );

        if let Err(e) = self.sla.complete(ticket.id).await {
            tracing::error!("Failed to update SLA of ticket {}: {:?}", ticket.code, e);
        }

        let validated = self
            .time_entries
            .validate_by_ticket(ticket.id, actor.user_id, now)
            .await?;
        tracing::info!(
            "Ticket {} validated by user {} ({} time entries validated)",
            ticket.code,
            actor.user_id,
            validated
        );

        let message = Self::message(
            &ticket,
            NotificationType::TicketValidated,
            "Ticket validated",
            format!("Ticket {} was validated by its requester", ticket.code),
        );
        self.notify_provider_it(&message).await;
        self.notifications
            .notify(ticket.created_by_id, &message)
            .await;

        self.to_response(ticket).await
    }

    pub async fn close(&self, id: Uuid, actor: &Actor) -> Result<TicketResponseDto> {
        let (ticket, changed) = self.transition(id, TicketStatus::Cloture, actor).await?;

        if changed {
            if let Err(e) = self.sla.complete(ticket.id).await {
                tracing::error!("Failed to update SLA of ticket {}: {:?}", ticket.code, e);
            }
        }

        self.to_response(ticket).await
    }

    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<()> {
        let ticket = self.require_ticket(id).await?;
        self.tickets.soft_delete(ticket.id).await?;
        self.history
            .record(NewTicketHistory::new(ticket.id, actor.user_id, HISTORY_DELETED));

        tracing::info!("Ticket {} deleted by user {}", ticket.code, actor.user_id);
        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<TicketResponseDto> {
        let ticket = self.require_ticket(id).await?;
        self.to_response(ticket).await
    }

    pub async fn list(
        &self,
        scope: &QueryScope,
        filter: &TicketFilter,
        pagination: &PaginationQuery,
    ) -> Result<Page<TicketResponseDto>> {
        let (tickets, total) = self
            .tickets
            .list(scope, filter, Window::from(pagination))
            .await?;

        let mut items = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            items.push(self.to_response(ticket).await?);
        }

        Ok(Page::new(items, total, pagination))
    }

    pub async fn history(&self, id: Uuid) -> Result<Vec<TicketHistory>> {
        let ticket = self.require_ticket(id).await?;
        self.histories.find_by_ticket(ticket.id).await
    }
}
