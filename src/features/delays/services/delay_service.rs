use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::delays::dtos::{
    CreateJustificationDto, DelayResponseDto, DelayStatsDto, JustificationResponseDto,
    UpdateJustificationDto, ValidateJustificationDto,
};
use crate::features::delays::models::{
    Delay, DelayFilter, DelayJustification, DelayStatus, JustificationStatus,
};
use crate::features::delays::repositories::{DelayJustificationRepository, DelayRepository};
use crate::features::delays::workers::DelaySyncScheduler;
use crate::features::notifications::models::{NotificationMessage, NotificationType};
use crate::features::notifications::NotificationService;
use crate::shared::policy::{AccessPolicy, Action, Actor, Resource};
use crate::shared::types::{Page, PaginationQuery, QueryScope, Window};

/// Delay listing and the justification review workflow
pub struct DelayService {
    delays: Arc<dyn DelayRepository>,
    justifications: Arc<dyn DelayJustificationRepository>,
    notifications: Arc<NotificationService>,
    scheduler: Arc<DelaySyncScheduler>,
    policy: AccessPolicy,
}

impl DelayService {
    pub fn new(
        delays: Arc<dyn DelayRepository>,
        justifications: Arc<dyn DelayJustificationRepository>,
        notifications: Arc<NotificationService>,
        scheduler: Arc<DelaySyncScheduler>,
    ) -> Self {
        Self {
            delays,
            justifications,
            notifications,
            scheduler,
            policy: AccessPolicy::new(),
        }
    }

    async fn require_delay(&self, id: Uuid) -> Result<Delay> {
        self.delays
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Delay '{}' not found", id)))
    }

    async fn require_justification(&self, id: Uuid) -> Result<DelayJustification> {
        self.justifications
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Justification '{}' not found", id)))
    }

    async fn with_justification(&self, delay: Delay) -> Result<DelayResponseDto> {
        let justification = self.justifications.find_by_delay(delay.id).await?;
        Ok(DelayResponseDto::new(delay, justification))
    }

    /// List delays visible in `scope`, kicking off a background sweep when due
    pub async fn list(
        &self,
        scope: &QueryScope,
        filter: &DelayFilter,
        pagination: &PaginationQuery,
    ) -> Result<Page<DelayResponseDto>> {
        self.scheduler.trigger().await;

        let (delays, total) = self
            .delays
            .list(scope, filter, Window::from(pagination))
            .await?;

        let mut items = Vec::with_capacity(delays.len());
        for delay in delays {
            items.push(self.with_justification(delay).await?);
        }

        Ok(Page::new(items, total, pagination))
    }

    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        filter: &DelayFilter,
        pagination: &PaginationQuery,
    ) -> Result<Page<DelayResponseDto>> {
        self.list(&QueryScope::User(user_id), filter, pagination).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<DelayResponseDto> {
        let delay = self.require_delay(id).await?;
        self.with_justification(delay).await
    }

    pub async fn get_by_ticket(&self, ticket_id: Uuid) -> Result<DelayResponseDto> {
        let delay = self
            .delays
            .find_by_ticket(ticket_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No delay recorded for ticket '{}'", ticket_id))
            })?;
        self.with_justification(delay).await
    }

    pub async fn stats(&self, scope: &QueryScope) -> Result<DelayStatsDto> {
        let counts: HashMap<DelayStatus, i64> =
            self.delays.count_by_status(scope).await?.into_iter().collect();
        Ok(DelayStatsDto::from(counts))
    }

    pub async fn get_justification(&self, delay_id: Uuid) -> Result<JustificationResponseDto> {
        self.justifications
            .find_by_delay(delay_id)
            .await?
            .map(Into::into)
            .ok_or_else(|| {
                AppError::NotFound(format!("No justification for delay '{}'", delay_id))
            })
    }

    pub async fn create_justification(
        &self,
        delay_id: Uuid,
        actor: &Actor,
        dto: CreateJustificationDto,
    ) -> Result<JustificationResponseDto> {
        dto.validate()?;

        let mut delay = self.require_delay(delay_id).await?;
        self.policy.authorize(
            actor,
            &Resource::Delay {
                owner_id: delay.user_id,
            },
            Action::Justify,
        )?;

        if let Some(existing) = self.justifications.find_by_delay(delay.id).await? {
            let resubmission = existing.status == JustificationStatus::Rejected
                && delay.status == DelayStatus::Unjustified;
            if !resubmission {
                return Err(AppError::Conflict(
                    "A justification already exists for this delay".into(),
                ));
            }
            self.justifications.delete(existing.id).await?;
        }

        let now = Utc::now();
        let justification = DelayJustification {
            id: Uuid::now_v7(),
            delay_id: delay.id,
            user_id: actor.user_id,
            justification: dto.justification.trim().to_string(),
            status: JustificationStatus::Pending,
            validated_by_id: None,
            validated_at: None,
            validation_comment: None,
            created_at: now,
            updated_at: now,
        };
        let justification = self.justifications.create(&justification).await?;

        delay.status = DelayStatus::Pending;
        self.delays.update(&delay).await?;

        tracing::info!(
            "Justification submitted for delay {} by user {}",
            delay.id,
            actor.user_id
        );

        Ok(justification.into())
    }

    pub async fn update_justification(
        &self,
        id: Uuid,
        actor: &Actor,
        dto: UpdateJustificationDto,
    ) -> Result<JustificationResponseDto> {
        dto.validate()?;

        let mut justification = self.require_justification(id).await?;
        self.policy.authorize(
            actor,
            &Resource::Justification {
                author_id: justification.user_id,
            },
            Action::Edit,
        )?;
        if justification.status != JustificationStatus::Pending {
            return Err(AppError::Conflict(
                "Only pending justifications can be edited".into(),
            ));
        }

        justification.justification = dto.justification.trim().to_string();
        let justification = self.justifications.update(&justification).await?;

        Ok(justification.into())
    }

    pub async fn validate_justification(
        &self,
        id: Uuid,
        actor: &Actor,
        dto: ValidateJustificationDto,
    ) -> Result<JustificationResponseDto> {
        let mut justification = self.require_justification(id).await?;
        if justification.status != JustificationStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Justification already {}",
                justification.status
            )));
        }

        self.policy.authorize(
            actor,
            &Resource::Justification {
                author_id: justification.user_id,
            },
            Action::Validate,
        )?;
        dto.validate()?;

        let mut delay = self.require_delay(justification.delay_id).await?;

        let (justification_status, delay_status) = if dto.validated {
            (JustificationStatus::Validated, DelayStatus::Justified)
        } else {
            (JustificationStatus::Rejected, DelayStatus::Rejected)
        };

        justification.status = justification_status;
        justification.validated_by_id = Some(actor.user_id);
        justification.validated_at = Some(Utc::now());
        justification.validation_comment = dto
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let justification = self.justifications.update(&justification).await?;

        delay.status = delay_status;
        let delay = self.delays.update(&delay).await?;

        tracing::info!(
            "Justification {} {} by user {}",
            justification.id,
            justification.status,
            actor.user_id
        );

        self.notify_reviewed(&delay, &justification).await;

        Ok(justification.into())
    }

    pub async fn reject_justification(
        &self,
        id: Uuid,
        actor: &Actor,
        comment: Option<String>,
    ) -> Result<JustificationResponseDto> {
        self.validate_justification(
            id,
            actor,
            ValidateJustificationDto {
                validated: false,
                comment,
            },
        )
        .await
    }

    pub async fn delete_justification(&self, id: Uuid, actor: &Actor) -> Result<()> {
        let justification = self.require_justification(id).await?;
        self.policy.authorize(
            actor,
            &Resource::Justification {
                author_id: justification.user_id,
            },
            Action::Delete,
        )?;
        if justification.status != JustificationStatus::Pending {
            return Err(AppError::Conflict(
                "Only pending justifications can be deleted".into(),
            ));
        }

        self.justifications.delete(justification.id).await?;

        if let Some(mut delay) = self.delays.find_by_id(justification.delay_id).await? {
            delay.status = DelayStatus::Unjustified;
            self.delays.update(&delay).await?;
        }

        Ok(())
    }

    async fn notify_reviewed(&self, delay: &Delay, justification: &DelayJustification) {
        let verdict = match justification.status {
            JustificationStatus::Validated => "accepted",
            _ => "rejected",
        };
        let mut message = format!("Your delay justification was {}.", verdict);
        if let Some(comment) = &justification.validation_comment {
            message.push_str(&format!(" Comment: {}", comment));
        }

        let notification = NotificationMessage::new(
            NotificationType::DelayJustificationReviewed,
            "Delay justification reviewed",
            message,
        )
        .link(format!("/tickets/{}", delay.ticket_id))
        .metadata(json!({
            "delay_id": delay.id,
            "ticket_id": delay.ticket_id,
            "justification_id": justification.id,
            "status": justification.status,
        }));

        self.notifications.notify(delay.user_id, &notification).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DelaySyncConfig;
    use crate::features::delays::services::DelayReconciler;
    use crate::shared::policy::Capabilities;
    use crate::shared::test_helpers::{sample_ticket, InMemoryStore};
    use tokio_test::assert_ok;

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: DelayService,
        owner: Actor,
        reviewer: Actor,
        delay: Delay,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let owner = Actor::new(Uuid::new_v4());
        let reviewer = Actor::with_capabilities(Uuid::new_v4(), Capabilities::all());

        let reconciler = Arc::new(DelayReconciler::new(store.clone(), store.clone()));
        let mut ticket = sample_ticket(Uuid::new_v4());
        ticket.estimated_time = Some(60);
        ticket.actual_time = Some(90);
        let ticket = store.insert_ticket(ticket).await;
        reconciler
            .reconcile(&ticket, Some(owner.user_id))
            .await
            .unwrap();
        let delay = store.delay_of(ticket.id).await.unwrap();

        let scheduler = Arc::new(DelaySyncScheduler::new(
            reconciler,
            &DelaySyncConfig::default(),
        ));
        let service = DelayService::new(
            store.clone(),
            store.clone(),
            Arc::new(NotificationService::new(store.clone())),
            scheduler,
        );

        Fixture {
            store,
            service,
            owner,
            reviewer,
            delay,
        }
    }

    fn text(s: &str) -> CreateJustificationDto {
        CreateJustificationDto {
            justification: s.to_string(),
        }
    }

    #[tokio::test]
    async fn test_only_owner_can_justify() {
        let f = fixture().await;
        let stranger = Actor::new(Uuid::new_v4());

        let result = f
            .service
            .create_justification(f.delay.id, &stranger, text("Vendor outage"))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let created = f
            .service
            .create_justification(f.delay.id, &f.owner, text("Vendor outage"))
            .await
            .unwrap();
        assert_eq!(created.status, JustificationStatus::Pending);
        assert_eq!(
            f.store.delay_of(f.delay.ticket_id).await.unwrap().status,
            DelayStatus::Pending
        );

        let again = f
            .service
            .create_justification(f.delay.id, &f.owner, text("Second try"))
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_empty_justification_is_rejected() {
        let f = fixture().await;
        let result = f
            .service
            .create_justification(f.delay.id, &f.owner, text(""))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_validation_marks_delay_justified_and_notifies_owner() {
        let f = fixture().await;
        let j = f
            .service
            .create_justification(f.delay.id, &f.owner, text("Waiting on supplier"))
            .await
            .unwrap();

        let reviewed = f
            .service
            .validate_justification(
                j.id,
                &f.reviewer,
                ValidateJustificationDto {
                    validated: true,
                    comment: Some(" ok ".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(reviewed.status, JustificationStatus::Validated);
        assert_eq!(reviewed.validated_by_id, Some(f.reviewer.user_id));
        assert_eq!(reviewed.validation_comment.as_deref(), Some("ok"));
        assert_eq!(
            f.store.delay_of(f.delay.ticket_id).await.unwrap().status,
            DelayStatus::Justified
        );

        let inbox = f.store.notifications_for(f.owner.user_id).await;
        assert_eq!(inbox.len(), 1);
        assert_eq!(
            inbox[0].notification_type,
            NotificationType::DelayJustificationReviewed
        );
    }

    #[tokio::test]
    async fn test_review_requires_pending_before_capability() {
        let f = fixture().await;
        let j = f
            .service
            .create_justification(f.delay.id, &f.owner, text("Scope grew"))
            .await
            .unwrap();

        let plain = Actor::new(Uuid::new_v4());
        let denied = f
            .service
            .reject_justification(j.id, &plain, None)
            .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        f.service
            .reject_justification(j.id, &f.reviewer, Some("Not convincing".into()))
            .await
            .unwrap();

        for actor in [&plain, &f.reviewer, &f.owner] {
            let result = f
                .service
                .validate_justification(
                    j.id,
                    actor,
                    ValidateJustificationDto {
                        validated: true,
                        comment: None,
                    },
                )
                .await;
            assert!(matches!(result, Err(AppError::Conflict(_))));
        }
    }

    #[tokio::test]
    async fn test_resubmission_after_rejection_and_recompute() {
        let f = fixture().await;
        let reconciler = DelayReconciler::new(f.store.clone(), f.store.clone());
        let j = f
            .service
            .create_justification(f.delay.id, &f.owner, text("First"))
            .await
            .unwrap();
        f.service
            .reject_justification(j.id, &f.reviewer, None)
            .await
            .unwrap();

        // Still rejected: no resubmission until the delay is re-opened
        let early = f
            .service
            .create_justification(f.delay.id, &f.owner, text("Second"))
            .await;
        assert!(matches!(early, Err(AppError::Conflict(_))));

        let ticket = f.store.ticket(f.delay.ticket_id).await.unwrap();
        reconciler.reconcile(&ticket, None).await.unwrap();
        assert_eq!(
            f.store.delay_of(ticket.id).await.unwrap().status,
            DelayStatus::Unjustified
        );

        let second = f
            .service
            .create_justification(f.delay.id, &f.owner, text("Second"))
            .await
            .unwrap();
        assert_eq!(second.justification, "Second");
        assert_eq!(
            f.service.get_justification(f.delay.id).await.unwrap().id,
            second.id
        );
    }

    #[tokio::test]
    async fn test_author_edits_and_deletes_pending_only() {
        let f = fixture().await;
        let j = f
            .service
            .create_justification(f.delay.id, &f.owner, text("Draft"))
            .await
            .unwrap();

        let stranger = Actor::new(Uuid::new_v4());
        let denied = f
            .service
            .update_justification(
                j.id,
                &stranger,
                UpdateJustificationDto {
                    justification: "Mine now".into(),
                },
            )
            .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let edited = f
            .service
            .update_justification(
                j.id,
                &f.owner,
                UpdateJustificationDto {
                    justification: "Final".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.justification, "Final");

        assert_ok!(f.service.delete_justification(j.id, &f.owner).await);
        assert_eq!(
            f.store.delay_of(f.delay.ticket_id).await.unwrap().status,
            DelayStatus::Unjustified
        );
        assert!(matches!(
            f.service.get_justification(f.delay.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_scopes_and_stats() {
        let f = fixture().await;
        let pagination = PaginationQuery::default();

        let mine = f
            .service
            .list_by_user(f.owner.user_id, &DelayFilter::default(), &pagination)
            .await
            .unwrap();
        assert_eq!(mine.total, 1);
        assert_eq!(mine.items[0].id, f.delay.id);

        let others = f
            .service
            .list_by_user(Uuid::new_v4(), &DelayFilter::default(), &pagination)
            .await
            .unwrap();
        assert_eq!(others.total, 0);

        let stats = f.service.stats(&QueryScope::All).await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.unjustified, 1);

        let by_ticket = f.service.get_by_ticket(f.delay.ticket_id).await.unwrap();
        assert_eq!(by_ticket.delay_time, 30);
        assert!(matches!(
            f.service.get_by_ticket(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
