use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::tickets::dtos::{CommentResponseDto, CreateCommentDto, UpdateCommentDto};
use crate::features::tickets::models::{NewTicketHistory, TicketComment};
use crate::features::tickets::repositories::{TicketCommentRepository, TicketRepository};
use crate::features::tickets::workers::HistoryWriter;
use crate::shared::constants::HISTORY_COMMENTED;
use crate::shared::policy::{AccessPolicy, Action, Actor, Resource};

/// Comments on tickets
pub struct CommentService {
    comments: Arc<dyn TicketCommentRepository>,
    tickets: Arc<dyn TicketRepository>,
    history: HistoryWriter,
    policy: AccessPolicy,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn TicketCommentRepository>,
        tickets: Arc<dyn TicketRepository>,
        history: HistoryWriter,
    ) -> Self {
        Self {
            comments,
            tickets,
            history,
            policy: AccessPolicy::new(),
        }
    }

    async fn require_comment(&self, id: Uuid) -> Result<TicketComment> {
        self.comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment '{}' not found", id)))
    }

    async fn ensure_ticket(&self, ticket_id: Uuid) -> Result<()> {
        self.tickets
            .find_by_id(ticket_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", ticket_id)))
    }

    pub async fn add(
        &self,
        ticket_id: Uuid,
        dto: CreateCommentDto,
        actor: &Actor,
    ) -> Result<CommentResponseDto> {
        dto.validate()?;
        self.ensure_ticket(ticket_id).await?;

        let now = Utc::now();
        let comment = TicketComment {
            id: Uuid::now_v7(),
            ticket_id,
            user_id: actor.user_id,
            content: dto.content.trim().to_string(),
            is_internal: dto.is_internal,
            created_at: now,
            updated_at: now,
        };
        let comment = self.comments.create(&comment).await?;

        self.history.record(
            NewTicketHistory::new(ticket_id, actor.user_id, HISTORY_COMMENTED).change(
                "comment",
                None,
                Some(comment.id.to_string()),
            ),
        );

        Ok(comment.into())
    }

    /// Comments of a ticket, internal ones only for callers allowed to see them
    pub async fn list(&self, ticket_id: Uuid, actor: &Actor) -> Result<Vec<CommentResponseDto>> {
        self.ensure_ticket(ticket_id).await?;

        let include_internal =
            self.policy
                .allows(actor, &Resource::CommentThread, Action::ViewInternal);
        let comments = self
            .comments
            .find_by_ticket(ticket_id, include_internal)
            .await?;

        Ok(comments.into_iter().map(Into::into).collect())
    }

    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateCommentDto,
        actor: &Actor,
    ) -> Result<CommentResponseDto> {
        dto.validate()?;

        let mut comment = self.require_comment(id).await?;
        self.policy.authorize(
            actor,
            &Resource::Comment {
                author_id: comment.user_id,
            },
            Action::Edit,
        )?;

        comment.content = dto.content.trim().to_string();
        let comment = self.comments.update(&comment).await?;

        Ok(comment.into())
    }

    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<()> {
        let comment = self.require_comment(id).await?;
        self.policy.authorize(
            actor,
            &Resource::Comment {
                author_id: comment.user_id,
            },
            Action::Delete,
        )?;

        self.comments.delete(comment.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::policy::Capabilities;
    use crate::shared::test_helpers::{sample_ticket, InMemoryStore};
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;
    use tokio_test::assert_ok;

    fn comment(is_internal: bool) -> CreateCommentDto {
        CreateCommentDto {
            content: Sentence(3..8).fake(),
            is_internal,
        }
    }

    async fn setup() -> (Arc<InMemoryStore>, CommentService, HistoryWriter, Uuid) {
        let store = InMemoryStore::new();
        let (history, _) = HistoryWriter::spawn(store.clone(), 16);
        let service = CommentService::new(store.clone(), store.clone(), history.clone());
        let ticket = store.insert_ticket(sample_ticket(Uuid::new_v4())).await;
        (store, service, history, ticket.id)
    }

    #[tokio::test]
    async fn test_internal_comments_need_capability() {
        let (_store, service, _history, ticket_id) = setup().await;
        let agent = Actor::with_capabilities(Uuid::new_v4(), Capabilities::all());
        let requester = Actor::new(Uuid::new_v4());

        service.add(ticket_id, comment(false), &requester).await.unwrap();
        service.add(ticket_id, comment(true), &agent).await.unwrap();

        assert_eq!(service.list(ticket_id, &agent).await.unwrap().len(), 2);
        let visible = service.list(ticket_id, &requester).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert!(!visible[0].is_internal);
    }

    #[tokio::test]
    async fn test_only_author_edits_or_deletes() {
        let (_store, service, _history, ticket_id) = setup().await;
        let author = Actor::new(Uuid::new_v4());
        let other = Actor::new(Uuid::new_v4());
        let created = service.add(ticket_id, comment(false), &author).await.unwrap();

        let edit = UpdateCommentDto {
            content: "Rebooted, works now".into(),
        };
        assert!(matches!(
            service.update(created.id, edit.clone(), &other).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete(created.id, &other).await,
            Err(AppError::Forbidden(_))
        ));

        let updated = service.update(created.id, edit, &author).await.unwrap();
        assert_eq!(updated.content, "Rebooted, works now");

        assert_ok!(service.delete(created.id, &author).await);
        assert!(matches!(
            service.delete(created.id, &author).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_comment_is_recorded_in_history() {
        let (store, service, history, ticket_id) = setup().await;
        let author = Actor::new(Uuid::new_v4());
        service.add(ticket_id, comment(false), &author).await.unwrap();

        history.flush().await;
        let entries = store.history_of(ticket_id).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, HISTORY_COMMENTED);

        assert!(matches!(
            service.add(Uuid::new_v4(), comment(false), &author).await,
            Err(AppError::NotFound(_))
        ));
    }
}
