//! In-memory implementations of every repository trait, for service tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::repositories::Repositories;
use crate::features::categories::models::TicketCategory;
use crate::features::categories::repositories::CategoryRepository;
use crate::features::delays::models::{Delay, DelayFilter, DelayJustification, DelayStatus};
use crate::features::delays::repositories::{DelayJustificationRepository, DelayRepository};
use crate::features::notifications::models::Notification;
use crate::features::notifications::repositories::NotificationRepository;
use crate::features::sla::models::{SlaRule, TicketSla};
use crate::features::sla::repositories::{SlaRuleRepository, TicketSlaRepository};
use crate::features::tickets::models::{
    NewTicketHistory, Ticket, TicketAssignee, TicketComment, TicketFilter, TicketHistory,
    TicketPriority, TicketStatus,
};
use crate::features::tickets::repositories::{
    TicketAssigneeRepository, TicketCommentRepository, TicketHistoryRepository, TicketRepository,
};
use crate::features::time_entries::models::{ProjectTask, TimeEntry, TimeEntryFilter};
use crate::features::time_entries::repositories::{ProjectTaskRepository, TimeEntryRepository};
use crate::features::users::models::{Department, Filiale, Role, User};
use crate::features::users::repositories::{OrganizationRepository, UserRepository};
use crate::shared::types::{QueryScope, Window};
use crate::shared::validation::parse_ticket_code;

/// A ticket with test defaults: open, medium priority, category `general`
pub fn sample_ticket(created_by_id: Uuid) -> Ticket {
    let now = Utc::now();
    Ticket {
        id: Uuid::now_v7(),
        code: format!("TEST-{}", Uuid::new_v4().simple()),
        title: "Sample ticket".to_string(),
        description: "Sample description".to_string(),
        category: "general".to_string(),
        source: "plateforme".to_string(),
        status: TicketStatus::Ouvert,
        priority: TicketPriority::Medium,
        created_by_id,
        requester_id: None,
        requester_name: None,
        requester_department: None,
        parent_id: None,
        assigned_to_id: None,
        lead_id: None,
        estimated_time: None,
        actual_time: None,
        filiale_id: None,
        software_id: None,
        validated_by_id: None,
        validated_at: None,
        closed_at: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

/// IDs of the organization created by [`InMemoryStore::seed_organization`]
#[derive(Debug, Clone, Copy)]
pub struct OrgFixture {
    /// Software provider filiale
    pub provider: Uuid,
    pub client: Uuid,
    /// IT department of the provider
    pub it_dept: Uuid,
    /// Non-IT department of the provider
    pub support_dept: Uuid,
    /// IT department of the client filiale
    pub client_dept: Uuid,
    pub client_role: Uuid,
}

fn simulated_outage() -> AppError {
    AppError::Database(sqlx::Error::PoolTimedOut)
}

#[derive(Default)]
struct State {
    tickets: Vec<Ticket>,
    assignees: Vec<TicketAssignee>,
    histories: Vec<TicketHistory>,
    comments: Vec<TicketComment>,
    categories: Vec<TicketCategory>,
    users: Vec<User>,
    filiales: Vec<Filiale>,
    departments: Vec<Department>,
    roles: Vec<Role>,
    sla_rules: Vec<SlaRule>,
    ticket_slas: Vec<TicketSla>,
    delays: Vec<Delay>,
    justifications: Vec<DelayJustification>,
    time_entries: Vec<TimeEntry>,
    tasks: Vec<ProjectTask>,
    notifications: Vec<Notification>,
    pinned_sequence: Option<i64>,
    fail_history: bool,
    fail_notifications: bool,
}

impl State {
    fn live_ticket(&self, id: Uuid) -> Option<&Ticket> {
        self.tickets
            .iter()
            .find(|t| t.id == id && t.deleted_at.is_none())
    }

    fn ticket_in_scope(&self, ticket: &Ticket, scope: &QueryScope) -> bool {
        match scope {
            QueryScope::All => true,
            QueryScope::Filiales(ids) => ticket.filiale_id.is_some_and(|f| ids.contains(&f)),
            QueryScope::User(user_id) => {
                ticket.created_by_id == *user_id
                    || ticket.assigned_to_id == Some(*user_id)
                    || self
                        .assignees
                        .iter()
                        .any(|a| a.ticket_id == ticket.id && a.user_id == *user_id)
            }
        }
    }
}

fn window<T: Clone>(items: &[T], window: Window) -> Vec<T> {
    items
        .iter()
        .skip(window.offset.max(0) as usize)
        .take(window.limit.max(0) as usize)
        .cloned()
        .collect()
}

/// Shared in-memory backing store. Every repository trait is implemented on
/// it, so one `Arc<InMemoryStore>` can be handed to any service.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            tickets: self.clone(),
            assignees: self.clone(),
            histories: self.clone(),
            comments: self.clone(),
            categories: self.clone(),
            users: self.clone(),
            organization: self.clone(),
            sla_rules: self.clone(),
            ticket_slas: self.clone(),
            delays: self.clone(),
            justifications: self.clone(),
            time_entries: self.clone(),
            project_tasks: self.clone(),
            notifications: self.clone(),
        }
    }

    /// Provider and client filiales with their departments and a client role
    pub async fn seed_organization(&self) -> OrgFixture {
        let fixture = OrgFixture {
            provider: Uuid::new_v4(),
            client: Uuid::new_v4(),
            it_dept: Uuid::new_v4(),
            support_dept: Uuid::new_v4(),
            client_dept: Uuid::new_v4(),
            client_role: Uuid::new_v4(),
        };

        let mut state = self.state.lock().await;
        state.filiales.push(Filiale {
            id: fixture.provider,
            code: "PRV".into(),
            name: "Provider".into(),
            is_software_provider: true,
            is_active: true,
        });
        state.filiales.push(Filiale {
            id: fixture.client,
            code: "CLI".into(),
            name: "Client".into(),
            is_software_provider: false,
            is_active: true,
        });
        state.departments.push(Department {
            id: fixture.it_dept,
            name: "IT".into(),
            filiale_id: Some(fixture.provider),
            is_it_department: true,
        });
        state.departments.push(Department {
            id: fixture.support_dept,
            name: "Support".into(),
            filiale_id: Some(fixture.provider),
            is_it_department: false,
        });
        state.departments.push(Department {
            id: fixture.client_dept,
            name: "Client IT".into(),
            filiale_id: Some(fixture.client),
            is_it_department: true,
        });
        state.roles.push(Role {
            id: fixture.client_role,
            name: "Client agent".into(),
            filiale_id: Some(fixture.client),
        });

        fixture
    }

    /// Active user with a generated name, no own filiale and no role
    pub async fn add_user(&self, department_id: Option<Uuid>) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            email: SafeEmail().fake(),
            filiale_id: None,
            role_id: None,
            department_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.users.push(user.clone());
        user
    }

    pub async fn add_category(&self, slug: &str, is_active: bool) -> TicketCategory {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let category = TicketCategory {
            id: Uuid::now_v7(),
            slug: slug.to_string(),
            name: slug.to_uppercase(),
            description: None,
            display_order: state.categories.len() as i32,
            is_active,
            created_at: now,
            updated_at: now,
        };
        state.categories.push(category.clone());
        category
    }

    pub async fn add_sla_rule(
        &self,
        category: &str,
        priority: Option<TicketPriority>,
        target_time: i32,
        unit: &str,
    ) -> Uuid {
        let now = Utc::now();
        let rule = SlaRule {
            id: Uuid::now_v7(),
            name: format!("{} {}{}", category, target_time, unit),
            category: category.to_string(),
            priority,
            target_time,
            unit: unit.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let id = rule.id;
        self.state.lock().await.sla_rules.push(rule);
        id
    }

    pub async fn add_task(&self, estimated_time: Option<i32>) -> ProjectTask {
        let now = Utc::now();
        let task = ProjectTask {
            id: Uuid::now_v7(),
            project_id: Uuid::new_v4(),
            title: "Sample task".into(),
            estimated_time,
            actual_time: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.tasks.push(task.clone());
        task
    }

    pub async fn insert_ticket(&self, ticket: Ticket) -> Ticket {
        self.state.lock().await.tickets.push(ticket.clone());
        ticket
    }

    /// Stored ticket, soft-deleted ones included
    pub async fn ticket(&self, id: Uuid) -> Option<Ticket> {
        self.state
            .lock()
            .await
            .tickets
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub async fn set_actual_time(&self, ticket_id: Uuid, minutes: Option<i32>) {
        let mut state = self.state.lock().await;
        if let Some(ticket) = state.tickets.iter_mut().find(|t| t.id == ticket_id) {
            ticket.actual_time = minutes;
        }
    }

    pub async fn task(&self, id: Uuid) -> Option<ProjectTask> {
        self.state
            .lock()
            .await
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub async fn delay_of(&self, ticket_id: Uuid) -> Option<Delay> {
        self.state
            .lock()
            .await
            .delays
            .iter()
            .find(|d| d.ticket_id == ticket_id)
            .cloned()
    }

    pub async fn set_delay_status(&self, ticket_id: Uuid, status: DelayStatus) {
        let mut state = self.state.lock().await;
        if let Some(delay) = state.delays.iter_mut().find(|d| d.ticket_id == ticket_id) {
            delay.status = status;
        }
    }

    pub async fn sla_of(&self, ticket_id: Uuid) -> Option<TicketSla> {
        self.state
            .lock()
            .await
            .ticket_slas
            .iter()
            .find(|s| s.ticket_id == ticket_id)
            .cloned()
    }

    /// History entries of a ticket in the order they were persisted
    pub async fn history_of(&self, ticket_id: Uuid) -> Vec<TicketHistory> {
        self.state
            .lock()
            .await
            .histories
            .iter()
            .filter(|h| h.ticket_id == ticket_id)
            .cloned()
            .collect()
    }

    pub async fn time_entries_of(&self, ticket_id: Uuid) -> Vec<TimeEntry> {
        self.state
            .lock()
            .await
            .time_entries
            .iter()
            .filter(|e| e.ticket_id == Some(ticket_id))
            .cloned()
            .collect()
    }

    pub async fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        self.state
            .lock()
            .await
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Force the suggested code sequence, as a concurrent writer could
    pub async fn pin_next_sequence(&self, sequence: Option<i64>) {
        self.state.lock().await.pinned_sequence = sequence;
    }

    pub async fn fail_history(&self, fail: bool) {
        self.state.lock().await.fail_history = fail;
    }

    pub async fn fail_notifications(&self, fail: bool) {
        self.state.lock().await.fail_notifications = fail;
    }
}

// =============================================================================
// TICKETS
// =============================================================================

#[async_trait]
impl TicketRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>> {
        Ok(self.state.lock().await.live_ticket(id).cloned())
    }

    async fn code_exists(&self, code: &str) -> Result<bool> {
        Ok(self.state.lock().await.tickets.iter().any(|t| t.code == code))
    }

    async fn next_sequence_number(&self, year: i32) -> Result<i64> {
        let state = self.state.lock().await;
        if let Some(pinned) = state.pinned_sequence {
            return Ok(pinned);
        }

        let max = state
            .tickets
            .iter()
            .filter_map(|t| parse_ticket_code(&t.code))
            .filter(|(y, _)| *y == year)
            .map(|(_, seq)| seq)
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }

    async fn create(&self, ticket: &Ticket) -> Result<Ticket> {
        let mut state = self.state.lock().await;
        if state.tickets.iter().any(|t| t.code == ticket.code) {
            return Err(AppError::Conflict(format!("Duplicate code {}", ticket.code)));
        }
        state.tickets.push(ticket.clone());
        Ok(ticket.clone())
    }

    async fn update(&self, ticket: &Ticket) -> Result<Ticket> {
        let mut state = self.state.lock().await;
        let stored = state
            .tickets
            .iter_mut()
            .find(|t| t.id == ticket.id && t.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", ticket.id)))?;

        let actual_time = stored.actual_time;
        *stored = Ticket {
            actual_time,
            updated_at: Utc::now(),
            ..ticket.clone()
        };
        Ok(stored.clone())
    }

    async fn update_actual_time(&self, id: Uuid, minutes: i32) -> Result<Option<Ticket>> {
        let mut state = self.state.lock().await;
        Ok(state
            .tickets
            .iter_mut()
            .find(|t| t.id == id && t.deleted_at.is_none())
            .map(|t| {
                t.actual_time = Some(minutes);
                t.updated_at = Utc::now();
                t.clone()
            }))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(ticket) = state
            .tickets
            .iter_mut()
            .find(|t| t.id == id && t.deleted_at.is_none())
        {
            ticket.deleted_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn list(
        &self,
        scope: &QueryScope,
        filter: &TicketFilter,
        w: Window,
    ) -> Result<(Vec<Ticket>, i64)> {
        let state = self.state.lock().await;
        let search = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut tickets: Vec<Ticket> = state
            .tickets
            .iter()
            .filter(|t| t.deleted_at.is_none())
            .filter(|t| state.ticket_in_scope(t, scope))
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| filter.priority.is_none_or(|p| t.priority == p))
            .filter(|t| filter.category.as_ref().is_none_or(|c| &t.category == c))
            .filter(|t| filter.assigned_to_id.is_none_or(|a| t.assigned_to_id == Some(a)))
            .filter(|t| {
                search.as_ref().is_none_or(|s| {
                    t.title.to_lowercase().contains(s) || t.code.to_lowercase().contains(s)
                })
            })
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = tickets.len() as i64;
        Ok((window(&tickets, w), total))
    }
}

#[async_trait]
impl TicketAssigneeRepository for InMemoryStore {
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Vec<TicketAssignee>> {
        let mut rows: Vec<TicketAssignee> = self
            .state
            .lock()
            .await
            .assignees
            .iter()
            .filter(|a| a.ticket_id == ticket_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| !a.is_lead);
        Ok(rows)
    }

    async fn replace(
        &self,
        ticket_id: Uuid,
        user_ids: &[Uuid],
        lead_id: Option<Uuid>,
    ) -> Result<()> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        state.assignees.retain(|a| a.ticket_id != ticket_id);
        state
            .assignees
            .extend(user_ids.iter().map(|user_id| TicketAssignee {
                ticket_id,
                user_id: *user_id,
                is_lead: lead_id == Some(*user_id),
                created_at: now,
            }));
        Ok(())
    }
}

#[async_trait]
impl TicketHistoryRepository for InMemoryStore {
    async fn create(&self, entry: &NewTicketHistory) -> Result<TicketHistory> {
        let mut state = self.state.lock().await;
        if state.fail_history {
            return Err(simulated_outage());
        }

        let history = TicketHistory {
            id: Uuid::now_v7(),
            ticket_id: entry.ticket_id,
            user_id: entry.user_id,
            action: entry.action.clone(),
            field_name: entry.field_name.clone(),
            old_value: entry.old_value.clone(),
            new_value: entry.new_value.clone(),
            created_at: entry.created_at,
        };
        state.histories.push(history.clone());
        Ok(history)
    }

    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Vec<TicketHistory>> {
        Ok(self.history_of(ticket_id).await)
    }
}

#[async_trait]
impl TicketCommentRepository for InMemoryStore {
    async fn create(&self, comment: &TicketComment) -> Result<TicketComment> {
        self.state.lock().await.comments.push(comment.clone());
        Ok(comment.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TicketComment>> {
        Ok(self
            .state
            .lock()
            .await
            .comments
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_by_ticket(
        &self,
        ticket_id: Uuid,
        include_internal: bool,
    ) -> Result<Vec<TicketComment>> {
        Ok(self
            .state
            .lock()
            .await
            .comments
            .iter()
            .filter(|c| c.ticket_id == ticket_id && (include_internal || !c.is_internal))
            .cloned()
            .collect())
    }

    async fn update(&self, comment: &TicketComment) -> Result<TicketComment> {
        let mut state = self.state.lock().await;
        let stored = state
            .comments
            .iter_mut()
            .find(|c| c.id == comment.id)
            .ok_or_else(|| AppError::NotFound(format!("Comment '{}' not found", comment.id)))?;
        *stored = TicketComment {
            updated_at: Utc::now(),
            ..comment.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.state.lock().await.comments.retain(|c| c.id != id);
        Ok(())
    }
}

// =============================================================================
// DIRECTORY
// =============================================================================

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_active_by_slug(&self, slug: &str) -> Result<Option<TicketCategory>> {
        Ok(self
            .state
            .lock()
            .await
            .categories
            .iter()
            .find(|c| c.slug == slug && c.is_active)
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<TicketCategory>> {
        let mut categories: Vec<TicketCategory> = self
            .state
            .lock()
            .await
            .categories
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(categories)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_active_it_users(&self, filiale_id: Uuid) -> Result<Vec<User>> {
        let state = self.state.lock().await;
        let it_departments: Vec<Uuid> = state
            .departments
            .iter()
            .filter(|d| d.is_it_department && d.filiale_id == Some(filiale_id))
            .map(|d| d.id)
            .collect();

        let mut users: Vec<User> = state
            .users
            .iter()
            .filter(|u| u.is_active)
            .filter(|u| u.department_id.is_some_and(|d| it_departments.contains(&d)))
            .cloned()
            .collect();
        users.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(users)
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryStore {
    async fn find_filiale(&self, id: Uuid) -> Result<Option<Filiale>> {
        Ok(self
            .state
            .lock()
            .await
            .filiales
            .iter()
            .find(|f| f.id == id)
            .cloned())
    }

    async fn find_department(&self, id: Uuid) -> Result<Option<Department>> {
        Ok(self
            .state
            .lock()
            .await
            .departments
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn find_role(&self, id: Uuid) -> Result<Option<Role>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn find_software_provider(&self) -> Result<Option<Filiale>> {
        Ok(self
            .state
            .lock()
            .await
            .filiales
            .iter()
            .find(|f| f.is_software_provider && f.is_active)
            .cloned())
    }
}

// =============================================================================
// SLA
// =============================================================================

#[async_trait]
impl SlaRuleRepository for InMemoryStore {
    async fn find_active_rule(
        &self,
        category: &str,
        priority: Option<TicketPriority>,
    ) -> Result<Option<SlaRule>> {
        let state = self.state.lock().await;
        Ok(state
            .sla_rules
            .iter()
            .filter(|r| r.is_active && r.category == category && r.priority == priority)
            .min_by_key(|r| r.created_at)
            .cloned())
    }
}

#[async_trait]
impl TicketSlaRepository for InMemoryStore {
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Option<TicketSla>> {
        Ok(self.sla_of(ticket_id).await)
    }

    async fn create(&self, sla: &TicketSla) -> Result<TicketSla> {
        let mut state = self.state.lock().await;
        if state.ticket_slas.iter().any(|s| s.ticket_id == sla.ticket_id) {
            return Err(AppError::Conflict("Ticket already has an SLA".into()));
        }
        state.ticket_slas.push(sla.clone());
        Ok(sla.clone())
    }

    async fn update(&self, sla: &TicketSla) -> Result<TicketSla> {
        let mut state = self.state.lock().await;
        let stored = state
            .ticket_slas
            .iter_mut()
            .find(|s| s.id == sla.id)
            .ok_or_else(|| AppError::NotFound(format!("SLA '{}' not found", sla.id)))?;
        *stored = TicketSla {
            updated_at: Utc::now(),
            ..sla.clone()
        };
        Ok(stored.clone())
    }
}

// =============================================================================
// DELAYS
// =============================================================================

#[async_trait]
impl DelayRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Delay>> {
        Ok(self
            .state
            .lock()
            .await
            .delays
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Option<Delay>> {
        Ok(self.delay_of(ticket_id).await)
    }

    async fn create(&self, delay: &Delay) -> Result<Delay> {
        let mut state = self.state.lock().await;
        if state.delays.iter().any(|d| d.ticket_id == delay.ticket_id) {
            return Err(AppError::Conflict("Ticket already has a delay".into()));
        }
        state.delays.push(delay.clone());
        Ok(delay.clone())
    }

    async fn update(&self, delay: &Delay) -> Result<Delay> {
        let mut state = self.state.lock().await;
        let stored = state
            .delays
            .iter_mut()
            .find(|d| d.id == delay.id)
            .ok_or_else(|| AppError::NotFound(format!("Delay '{}' not found", delay.id)))?;
        *stored = Delay {
            updated_at: Utc::now(),
            ..delay.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        state.delays.retain(|d| d.id != id);
        state.justifications.retain(|j| j.delay_id != id);
        Ok(())
    }

    async fn list(
        &self,
        scope: &QueryScope,
        filter: &DelayFilter,
        w: Window,
    ) -> Result<(Vec<Delay>, i64)> {
        let state = self.state.lock().await;
        let mut delays: Vec<Delay> = state
            .delays
            .iter()
            .filter(|d| {
                let Some(ticket) = state.live_ticket(d.ticket_id) else {
                    return false;
                };
                match scope {
                    QueryScope::User(user_id) => d.user_id == *user_id,
                    other => state.ticket_in_scope(ticket, other),
                }
            })
            .filter(|d| filter.status.is_none_or(|s| d.status == s))
            .filter(|d| filter.user_id.is_none_or(|u| d.user_id == u))
            .cloned()
            .collect();
        delays.sort_by(|a, b| b.detected_at.cmp(&a.detected_at).then(a.id.cmp(&b.id)));

        let total = delays.len() as i64;
        Ok((window(&delays, w), total))
    }

    async fn count_by_status(&self, scope: &QueryScope) -> Result<Vec<(DelayStatus, i64)>> {
        let (delays, _) = DelayRepository::list(
            self,
            scope,
            &DelayFilter::default(),
            Window {
                offset: 0,
                limit: i64::MAX,
            },
        )
        .await?;

        let mut counts: HashMap<DelayStatus, i64> = HashMap::new();
        for delay in delays {
            *counts.entry(delay.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

#[async_trait]
impl DelayJustificationRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DelayJustification>> {
        Ok(self
            .state
            .lock()
            .await
            .justifications
            .iter()
            .find(|j| j.id == id)
            .cloned())
    }

    async fn find_by_delay(&self, delay_id: Uuid) -> Result<Option<DelayJustification>> {
        Ok(self
            .state
            .lock()
            .await
            .justifications
            .iter()
            .find(|j| j.delay_id == delay_id)
            .cloned())
    }

    async fn create(&self, justification: &DelayJustification) -> Result<DelayJustification> {
        let mut state = self.state.lock().await;
        if state
            .justifications
            .iter()
            .any(|j| j.delay_id == justification.delay_id)
        {
            return Err(AppError::Conflict("Delay already has a justification".into()));
        }
        state.justifications.push(justification.clone());
        Ok(justification.clone())
    }

    async fn update(&self, justification: &DelayJustification) -> Result<DelayJustification> {
        let mut state = self.state.lock().await;
        let stored = state
            .justifications
            .iter_mut()
            .find(|j| j.id == justification.id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Justification '{}' not found", justification.id))
            })?;
        *stored = DelayJustification {
            updated_at: Utc::now(),
            ..justification.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.state.lock().await.justifications.retain(|j| j.id != id);
        Ok(())
    }
}

// =============================================================================
// TIME ENTRIES
// =============================================================================

#[async_trait]
impl TimeEntryRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeEntry>> {
        Ok(self
            .state
            .lock()
            .await
            .time_entries
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn create(&self, entry: &TimeEntry) -> Result<TimeEntry> {
        self.state.lock().await.time_entries.push(entry.clone());
        Ok(entry.clone())
    }

    async fn update(&self, entry: &TimeEntry) -> Result<TimeEntry> {
        let mut state = self.state.lock().await;
        let stored = state
            .time_entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| AppError::NotFound(format!("Time entry '{}' not found", entry.id)))?;
        *stored = TimeEntry {
            updated_at: Utc::now(),
            ..entry.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.state.lock().await.time_entries.retain(|e| e.id != id);
        Ok(())
    }

    async fn sum_by_ticket(&self, ticket_id: Uuid) -> Result<i64> {
        Ok(self
            .state
            .lock()
            .await
            .time_entries
            .iter()
            .filter(|e| e.ticket_id == Some(ticket_id))
            .map(|e| i64::from(e.time_spent))
            .sum())
    }

    async fn sum_by_task(&self, task_id: Uuid) -> Result<i64> {
        Ok(self
            .state
            .lock()
            .await
            .time_entries
            .iter()
            .filter(|e| e.task_id == Some(task_id))
            .map(|e| i64::from(e.time_spent))
            .sum())
    }

    async fn list(
        &self,
        scope: &QueryScope,
        filter: &TimeEntryFilter,
        w: Window,
    ) -> Result<(Vec<TimeEntry>, i64)> {
        let state = self.state.lock().await;
        let mut entries: Vec<TimeEntry> = state
            .time_entries
            .iter()
            .filter(|e| {
                let ticket = e.ticket_id.map(|id| state.live_ticket(id));
                if matches!(ticket, Some(None)) {
                    return false;
                }
                match scope {
                    QueryScope::All => true,
                    QueryScope::User(user_id) => e.user_id == *user_id,
                    QueryScope::Filiales(_) => {
                        ticket.flatten().is_some_and(|t| state.ticket_in_scope(t, scope))
                    }
                }
            })
            .filter(|e| filter.ticket_id.is_none_or(|id| e.ticket_id == Some(id)))
            .filter(|e| filter.task_id.is_none_or(|id| e.task_id == Some(id)))
            .filter(|e| filter.user_id.is_none_or(|id| e.user_id == id))
            .filter(|e| filter.validated.is_none_or(|v| e.validated == v))
            .filter(|e| filter.date_from.is_none_or(|d| e.date >= d))
            .filter(|e| filter.date_to.is_none_or(|d| e.date <= d))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let total = entries.len() as i64;
        Ok((window(&entries, w), total))
    }

    async fn validate_by_ticket(
        &self,
        ticket_id: Uuid,
        validator_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64> {
        let mut state = self.state.lock().await;
        let mut touched = 0;
        for entry in state
            .time_entries
            .iter_mut()
            .filter(|e| e.ticket_id == Some(ticket_id) && !e.validated)
        {
            entry.validated = true;
            entry.validated_by_id = Some(validator_id);
            entry.validated_at = Some(at);
            touched += 1;
        }
        Ok(touched)
    }
}

#[async_trait]
impl ProjectTaskRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProjectTask>> {
        Ok(self.task(id).await)
    }

    async fn update_actual_time(&self, id: Uuid, minutes: i32) -> Result<Option<ProjectTask>> {
        let mut state = self.state.lock().await;
        Ok(state.tasks.iter_mut().find(|t| t.id == id).map(|t| {
            t.actual_time = Some(minutes);
            t.updated_at = Utc::now();
            t.clone()
        }))
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn create(&self, notification: &Notification) -> Result<Notification> {
        let mut state = self.state.lock().await;
        if state.fail_notifications {
            return Err(simulated_outage());
        }
        state.notifications.push(notification.clone());
        Ok(notification.clone())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let mut notifications = self.notifications_for(user_id).await;
        notifications.reverse();
        Ok(notifications)
    }
}
