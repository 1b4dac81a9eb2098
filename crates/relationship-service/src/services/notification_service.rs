use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    events::types::RelationshipEvent,
    external_services::user_directory::UserDirectory,
    models::notifications::{NewNotification, Notification, NotificationType},
    repositories::relationship_repository::RelationshipRepository,
    utils::errors::app_error::AppError,
};

/// Fan-out consumer plus the pull-based notification feed. Writes are
/// best-effort and at-most-once: a failed write is logged and dropped,
/// never retried, and the transition that produced the event has long
/// since committed. Relationship views are always derived from the edge
/// tables, so a lost notification costs feed content, not correctness.
pub struct NotificationService {
    repository: Arc<dyn RelationshipRepository>,
    user_directory: Arc<dyn UserDirectory>,
}

impl NotificationService {
    pub fn new(
        repository: Arc<dyn RelationshipRepository>,
        user_directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            repository,
            user_directory,
        }
    }

    /// Drains the relationship event channel for the life of the process.
    pub async fn run(self: Arc<Self>, mut events: UnboundedReceiver<RelationshipEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle_event(&event).await {
                error!("Failed to write notification for {:?}: {}", event, e);
            }
        }
    }

    /// Translates one committed transition into a stored notification
    /// addressed to the affected counterpart.
    pub async fn handle_event(&self, event: &RelationshipEvent) -> Result<Notification, AppError> {
        let notification = match event {
            RelationshipEvent::FriendRequestSent { request } => NewNotification {
                user_id: request.receiver_id,
                notification_type: NotificationType::FriendRequest,
                title: "New friend request".to_string(),
                message: match self.username_of(request.sender_id).await {
                    Some(username) => format!("{} sent you a friend request", username),
                    None => "You received a friend request".to_string(),
                },
                related_id: Some(request.id),
            },
            RelationshipEvent::FriendRequestResponded { request, accepted } => {
                let verb = if *accepted { "accepted" } else { "declined" };
                NewNotification {
                    user_id: request.sender_id,
                    notification_type: NotificationType::FriendRequestResponse,
                    title: "Friend request update".to_string(),
                    message: match self.username_of(request.receiver_id).await {
                        Some(username) => format!("{} {} your friend request", username, verb),
                        None => format!("Your friend request was {}", verb),
                    },
                    related_id: Some(request.id),
                }
            }
            RelationshipEvent::CreatorFollowed { follow } => NewNotification {
                user_id: follow.followed_id,
                notification_type: NotificationType::Follow,
                title: "New follower".to_string(),
                message: match self.username_of(follow.follower_id).await {
                    Some(username) => format!("{} started following you", username),
                    None => "You have a new follower".to_string(),
                },
                related_id: Some(follow.id),
            },
        };

        Ok(self.repository.insert_notification(notification).await?)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        Ok(self.repository.list_notifications_for(user_id).await?)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        Ok(self.repository.count_unread_notifications(user_id).await?)
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let updated = self.repository.mark_notification_read(id, user_id).await?;
        if !updated {
            return Err(AppError::NotFound(format!("Notification {} not found", id)));
        }

        Ok(())
    }

    /// Message enrichment only; a directory miss degrades the text, it
    /// never suppresses the write.
    async fn username_of(&self, user_id: Uuid) -> Option<String> {
        match self.user_directory.lookup(user_id).await {
            Ok(profile) => profile.map(|p| p.username),
            Err(e) => {
                warn!(
                    "Directory lookup for {} failed while composing a notification: {}",
                    user_id, e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use uuid::Uuid;

    use crate::{
        events::EventPublisher,
        external_services::user_directory::testing::{profile, StaticUserDirectory},
        models::{
            friend_requests::{FriendRequest, FriendRequestStatus},
            users::UserRole,
        },
        repositories::memory::InMemoryRelationshipRepository,
    };

    use super::*;

    struct Fixture {
        service: Arc<NotificationService>,
        repository: Arc<InMemoryRelationshipRepository>,
        alice: Uuid,
        bob: Uuid,
    }

    fn fixture() -> Fixture {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let repository = Arc::new(InMemoryRelationshipRepository::new());
        let directory = Arc::new(StaticUserDirectory::new([
            profile(alice, "alice", UserRole::NormalUser),
            profile(bob, "bob", UserRole::NormalUser),
        ]));
        let service = Arc::new(NotificationService::new(repository.clone(), directory));
        Fixture {
            service,
            repository,
            alice,
            bob,
        }
    }

    fn pending_request(sender_id: Uuid, receiver_id: Uuid) -> FriendRequest {
        let now = chrono::Utc::now();
        FriendRequest {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            status: FriendRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn request_sent_notifies_the_receiver() {
        let fx = fixture();
        let request = pending_request(fx.alice, fx.bob);

        let written = fx
            .service
            .handle_event(&RelationshipEvent::FriendRequestSent {
                request: request.clone(),
            })
            .await
            .unwrap();

        assert_eq!(written.user_id, fx.bob);
        assert_eq!(written.notification_type, NotificationType::FriendRequest);
        assert_eq!(written.message, "alice sent you a friend request");
        assert_eq!(written.related_id, Some(request.id));
        assert!(!written.is_read);
    }

    #[tokio::test]
    async fn response_notifies_the_sender() {
        let fx = fixture();
        let mut request = pending_request(fx.alice, fx.bob);
        request.status = FriendRequestStatus::Accepted;

        let written = fx
            .service
            .handle_event(&RelationshipEvent::FriendRequestResponded {
                request,
                accepted: true,
            })
            .await
            .unwrap();

        assert_eq!(written.user_id, fx.alice);
        assert_eq!(
            written.notification_type,
            NotificationType::FriendRequestResponse
        );
        assert_eq!(written.message, "bob accepted your friend request");
    }

    #[tokio::test]
    async fn unknown_counterpart_degrades_the_message() {
        let fx = fixture();
        let request = pending_request(Uuid::new_v4(), fx.bob);

        let written = fx
            .service
            .handle_event(&RelationshipEvent::FriendRequestSent { request })
            .await
            .unwrap();

        assert_eq!(written.message, "You received a friend request");
    }

    #[tokio::test]
    async fn store_outage_surfaces_but_writes_nothing() {
        let fx = fixture();
        fx.repository.set_notifications_unavailable(true);
        let request = pending_request(fx.alice, fx.bob);

        let result = fx
            .service
            .handle_event(&RelationshipEvent::FriendRequestSent { request })
            .await;

        assert!(result.is_err());
        assert!(fx.repository.notifications_snapshot().is_empty());
    }

    #[tokio::test]
    async fn run_loop_swallows_failures_and_keeps_consuming() {
        let fx = fixture();
        let (publisher, receiver) = EventPublisher::channel();
        let consumer = tokio::spawn(fx.service.clone().run(receiver));

        fx.repository.set_notifications_unavailable(true);
        publisher.publish(RelationshipEvent::FriendRequestSent {
            request: pending_request(fx.alice, fx.bob),
        });

        fx.repository.set_notifications_unavailable(false);
        publisher.publish(RelationshipEvent::FriendRequestSent {
            request: pending_request(fx.bob, fx.alice),
        });

        tokio::time::sleep(Duration::from_millis(50)).await;

        // The failed write is gone for good, the later one landed.
        let written = fx.repository.notifications_snapshot();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].user_id, fx.alice);

        consumer.abort();
    }

    #[tokio::test]
    async fn mark_read_is_scoped_to_the_addressee() {
        let fx = fixture();
        let written = fx
            .service
            .handle_event(&RelationshipEvent::FriendRequestSent {
                request: pending_request(fx.alice, fx.bob),
            })
            .await
            .unwrap();

        let wrong_user = fx.service.mark_read(written.id, fx.alice).await;
        assert!(matches!(wrong_user, Err(AppError::NotFound(_))));

        fx.service.mark_read(written.id, fx.bob).await.unwrap();
        assert_eq!(fx.service.unread_count(fx.bob).await.unwrap(), 0);
    }
}
