use std::sync::Arc;

use crate::core::config::{DelaySyncConfig, TicketConfig};
use crate::core::repositories::Repositories;
use crate::features::categories::CategoryService;
use crate::features::delays::{DelayReconciler, DelayService, DelaySyncScheduler};
use crate::features::notifications::NotificationService;
use crate::features::sla::SlaService;
use crate::features::tickets::{CommentService, HistoryWriter, TicketService};
use crate::features::time_entries::TimeEntryService;
use crate::features::users::DirectoryService;

/// Fully wired service layer sharing one history writer and one delay
/// sweep scheduler. Transports embedding the crate hold this.
#[derive(Clone)]
pub struct Services {
    pub tickets: Arc<TicketService>,
    pub comments: Arc<CommentService>,
    pub delays: Arc<DelayService>,
    pub time_entries: Arc<TimeEntryService>,
    pub notifications: Arc<NotificationService>,
    pub categories: Arc<CategoryService>,
    pub directory: Arc<DirectoryService>,
    pub sla: Arc<SlaService>,
    pub reconciler: Arc<DelayReconciler>,
    pub delay_sync: Arc<DelaySyncScheduler>,
    pub history: HistoryWriter,
}

impl Services {
    pub fn new(
        repos: &Repositories,
        history: HistoryWriter,
        tickets: &TicketConfig,
        delay_sync: &DelaySyncConfig,
    ) -> Self {
        let notifications = Arc::new(NotificationService::new(repos.notifications.clone()));
        let reconciler = Arc::new(DelayReconciler::new(
            repos.tickets.clone(),
            repos.delays.clone(),
        ));
        let scheduler = Arc::new(DelaySyncScheduler::new(Arc::clone(&reconciler), delay_sync));

        Self {
            tickets: Arc::new(TicketService::new(
                repos,
                history.clone(),
                Arc::clone(&notifications),
                Arc::clone(&reconciler),
                tickets,
            )),
            comments: Arc::new(CommentService::new(
                repos.comments.clone(),
                repos.tickets.clone(),
                history.clone(),
            )),
            delays: Arc::new(DelayService::new(
                repos.delays.clone(),
                repos.justifications.clone(),
                Arc::clone(&notifications),
                Arc::clone(&scheduler),
            )),
            time_entries: Arc::new(TimeEntryService::new(
                repos.time_entries.clone(),
                repos.project_tasks.clone(),
                repos.tickets.clone(),
                Arc::clone(&reconciler),
            )),
            categories: Arc::new(CategoryService::new(repos.categories.clone())),
            directory: Arc::new(DirectoryService::new(
                repos.users.clone(),
                repos.organization.clone(),
            )),
            sla: Arc::new(SlaService::new(
                repos.sla_rules.clone(),
                repos.ticket_slas.clone(),
            )),
            notifications,
            reconciler,
            delay_sync: scheduler,
            history,
        }
    }
}
