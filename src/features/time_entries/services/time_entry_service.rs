use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::delays::DelayReconciler;
use crate::features::tickets::repositories::TicketRepository;
use crate::features::time_entries::dtos::{
    CreateTimeEntryDto, TimeEntryResponseDto, UpdateTimeEntryDto, ValidateTimeEntryDto,
};
use crate::features::time_entries::models::{EntryTarget, TimeEntry, TimeEntryFilter};
use crate::features::time_entries::repositories::{ProjectTaskRepository, TimeEntryRepository};
use crate::shared::policy::{AccessPolicy, Action, Actor, Resource};
use crate::shared::types::{Page, PaginationQuery, QueryScope, Window};
use crate::shared::validation::{parse_date, require_id};

fn require_time_spent(minutes: i32) -> Result<i32> {
    if minutes == 0 {
        return Err(AppError::Validation("Time spent must not be zero".into()));
    }
    Ok(minutes)
}

fn clamp_minutes(total: i64) -> i32 {
    i32::try_from(total).unwrap_or(if total < 0 { i32::MIN } else { i32::MAX })
}

/// Time entry ledger. Every mutation recomputes the actual time of the
/// ticket or task it is booked against, and re-derives the ticket's delay.
pub struct TimeEntryService {
    entries: Arc<dyn TimeEntryRepository>,
    tasks: Arc<dyn ProjectTaskRepository>,
    tickets: Arc<dyn TicketRepository>,
    reconciler: Arc<DelayReconciler>,
    policy: AccessPolicy,
}

impl TimeEntryService {
    pub fn new(
        entries: Arc<dyn TimeEntryRepository>,
        tasks: Arc<dyn ProjectTaskRepository>,
        tickets: Arc<dyn TicketRepository>,
        reconciler: Arc<DelayReconciler>,
    ) -> Self {
        Self {
            entries,
            tasks,
            tickets,
            reconciler,
            policy: AccessPolicy::new(),
        }
    }

    async fn require_entry(&self, id: Uuid) -> Result<TimeEntry> {
        self.entries
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Time entry '{}' not found", id)))
    }

    async fn resolve_target(&self, dto: &CreateTimeEntryDto) -> Result<EntryTarget> {
        match (dto.ticket_id, dto.task_id) {
            (Some(ticket_id), None) => {
                let ticket_id = require_id("ticket_id", ticket_id)?;
                self.tickets
                    .find_by_id(ticket_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", ticket_id)))?;
                Ok(EntryTarget::Ticket(ticket_id))
            }
            (None, Some(task_id)) => {
                let task_id = require_id("task_id", task_id)?;
                self.tasks
                    .find_by_id(task_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Task '{}' not found", task_id)))?;
                Ok(EntryTarget::Task(task_id))
            }
            _ => Err(AppError::Validation(
                "Exactly one of ticket_id and task_id is required".into(),
            )),
        }
    }

    /// Recompute the target's actual time and, for tickets, its delay
    async fn recompute(&self, target: EntryTarget, actor_id: Uuid) -> Result<()> {
        match target {
            EntryTarget::Ticket(ticket_id) => {
                let total = clamp_minutes(self.entries.sum_by_ticket(ticket_id).await?);
                let Some(ticket) = self.tickets.update_actual_time(ticket_id, total).await? else {
                    tracing::warn!("Ticket {} vanished before its actual time was updated", ticket_id);
                    return Ok(());
                };
                self.reconciler.reconcile(&ticket, Some(actor_id)).await?;
            }
            EntryTarget::Task(task_id) => {
                let total = clamp_minutes(self.entries.sum_by_task(task_id).await?);
                self.tasks.update_actual_time(task_id, total).await?;
            }
        }

        Ok(())
    }

    pub async fn create(&self, dto: CreateTimeEntryDto, actor: &Actor) -> Result<TimeEntryResponseDto> {
        dto.validate()?;

        let target = self.resolve_target(&dto).await?;
        let date = parse_date("date", &dto.date)?;
        let time_spent = require_time_spent(dto.time_spent)?;

        let now = Utc::now();
        let (ticket_id, task_id) = match target {
            EntryTarget::Ticket(id) => (Some(id), None),
            EntryTarget::Task(id) => (None, Some(id)),
        };
        let entry = TimeEntry {
            id: Uuid::now_v7(),
            ticket_id,
            task_id,
            user_id: actor.user_id,
            date,
            time_spent,
            description: dto.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            validated: false,
            validated_by_id: None,
            validated_at: None,
            created_at: now,
            updated_at: now,
        };

        let entry = self.entries.create(&entry).await?;
        tracing::info!(
            "Time entry {} logged by user {}: {} minutes",
            entry.id,
            actor.user_id,
            entry.time_spent
        );

        self.recompute(target, actor.user_id).await?;

        Ok(entry.into())
    }

    /// Load an entry the actor may still modify
    async fn require_mutable(&self, id: Uuid, actor: &Actor, action: Action) -> Result<TimeEntry> {
        let entry = self.require_entry(id).await?;
        self.policy.authorize(
            actor,
            &Resource::TimeEntry {
                owner_id: entry.user_id,
            },
            action,
        )?;
        if entry.validated {
            return Err(AppError::Conflict(
                "Validated time entries cannot be modified".into(),
            ));
        }
        Ok(entry)
    }

    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateTimeEntryDto,
        actor: &Actor,
    ) -> Result<TimeEntryResponseDto> {
        dto.validate()?;

        let mut entry = self.require_mutable(id, actor, Action::Edit).await?;

        if let Some(date) = &dto.date {
            entry.date = parse_date("date", date)?;
        }
        if let Some(minutes) = dto.time_spent {
            entry.time_spent = require_time_spent(minutes)?;
        }
        if let Some(description) = dto.description {
            let description = description.trim().to_string();
            entry.description = (!description.is_empty()).then_some(description);
        }

        let entry = self.entries.update(&entry).await?;
        if let Some(target) = entry.target() {
            self.recompute(target, actor.user_id).await?;
        }

        Ok(entry.into())
    }

    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<()> {
        let entry = self.require_mutable(id, actor, Action::Delete).await?;

        self.entries.delete(entry.id).await?;
        tracing::info!("Time entry {} deleted by user {}", entry.id, actor.user_id);

        if let Some(target) = entry.target() {
            self.recompute(target, actor.user_id).await?;
        }

        Ok(())
    }

    pub async fn validate(
        &self,
        id: Uuid,
        dto: ValidateTimeEntryDto,
        actor: &Actor,
    ) -> Result<TimeEntryResponseDto> {
        let mut entry = self.require_entry(id).await?;
        self.policy.authorize(
            actor,
            &Resource::TimeEntry {
                owner_id: entry.user_id,
            },
            Action::Validate,
        )?;

        if dto.validated {
            entry.validated = true;
            entry.validated_by_id = Some(actor.user_id);
            entry.validated_at = Some(Utc::now());
        } else {
            entry.validated = false;
            entry.validated_by_id = None;
            entry.validated_at = None;
        }

        let entry = self.entries.update(&entry).await?;
        Ok(entry.into())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<TimeEntryResponseDto> {
        self.require_entry(id).await.map(Into::into)
    }

    pub async fn list(
        &self,
        scope: &QueryScope,
        filter: &TimeEntryFilter,
        pagination: &PaginationQuery,
    ) -> Result<Page<TimeEntryResponseDto>> {
        let (entries, total) = self
            .entries
            .list(scope, filter, Window::from(pagination))
            .await?;

        Ok(Page::new(entries, total, pagination).map(Into::into))
    }

    pub async fn list_by_ticket(
        &self,
        ticket_id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<Page<TimeEntryResponseDto>> {
        self.tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", ticket_id)))?;

        let filter = TimeEntryFilter {
            ticket_id: Some(ticket_id),
            ..Default::default()
        };
        self.list(&QueryScope::All, &filter, pagination).await
    }
}
