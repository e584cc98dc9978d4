use std::sync::Arc;

use sqlx::PgPool;

use crate::features::categories::repositories::{CategoryRepository, PgCategoryRepository};
use crate::features::delays::repositories::{
    DelayJustificationRepository, DelayRepository, PgDelayJustificationRepository,
    PgDelayRepository,
};
use crate::features::notifications::repositories::{
    NotificationRepository, PgNotificationRepository,
};
use crate::features::sla::repositories::{PgSlaRepository, SlaRuleRepository, TicketSlaRepository};
use crate::features::tickets::repositories::{
    PgTicketAssigneeRepository, PgTicketCommentRepository, PgTicketHistoryRepository,
    PgTicketRepository, TicketAssigneeRepository, TicketCommentRepository,
    TicketHistoryRepository, TicketRepository,
};
use crate::features::time_entries::repositories::{
    PgProjectTaskRepository, PgTimeEntryRepository, ProjectTaskRepository, TimeEntryRepository,
};
use crate::features::users::repositories::{
    OrganizationRepository, PgOrganizationRepository, PgUserRepository, UserRepository,
};

/// Every persistence port the services depend on
#[derive(Clone)]
pub struct Repositories {
    pub tickets: Arc<dyn TicketRepository>,
    pub assignees: Arc<dyn TicketAssigneeRepository>,
    pub histories: Arc<dyn TicketHistoryRepository>,
    pub comments: Arc<dyn TicketCommentRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub users: Arc<dyn UserRepository>,
    pub organization: Arc<dyn OrganizationRepository>,
    pub sla_rules: Arc<dyn SlaRuleRepository>,
    pub ticket_slas: Arc<dyn TicketSlaRepository>,
    pub delays: Arc<dyn DelayRepository>,
    pub justifications: Arc<dyn DelayJustificationRepository>,
    pub time_entries: Arc<dyn TimeEntryRepository>,
    pub project_tasks: Arc<dyn ProjectTaskRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        let sla = Arc::new(PgSlaRepository::new(pool.clone()));

        Self {
            tickets: Arc::new(PgTicketRepository::new(pool.clone())),
            assignees: Arc::new(PgTicketAssigneeRepository::new(pool.clone())),
            histories: Arc::new(PgTicketHistoryRepository::new(pool.clone())),
            comments: Arc::new(PgTicketCommentRepository::new(pool.clone())),
            categories: Arc::new(PgCategoryRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            organization: Arc::new(PgOrganizationRepository::new(pool.clone())),
            sla_rules: sla.clone(),
            ticket_slas: sla,
            delays: Arc::new(PgDelayRepository::new(pool.clone())),
            justifications: Arc::new(PgDelayJustificationRepository::new(pool.clone())),
            time_entries: Arc::new(PgTimeEntryRepository::new(pool.clone())),
            project_tasks: Arc::new(PgProjectTaskRepository::new(pool.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool)),
        }
    }
}
