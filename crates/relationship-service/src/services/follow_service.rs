use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    events::{types::RelationshipEvent, EventPublisher},
    external_services::user_directory::UserDirectory,
    models::users::{UserProfile, UserRole},
    repositories::relationship_repository::{RelationshipRepository, StoreError},
    utils::errors::app_error::{AppError, ConflictReason},
};

/// Idempotent toggle relation for creator follows. Far simpler than the
/// friendship machine: an edge either exists or it does not.
#[derive(Clone)]
pub struct FollowService {
    repository: Arc<dyn RelationshipRepository>,
    user_directory: Arc<dyn UserDirectory>,
    events: EventPublisher,
}

impl FollowService {
    pub fn new(
        repository: Arc<dyn RelationshipRepository>,
        user_directory: Arc<dyn UserDirectory>,
        events: EventPublisher,
    ) -> Self {
        Self {
            repository,
            user_directory,
            events,
        }
    }

    pub async fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<(), AppError> {
        if follower_id == followed_id {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        self.require_user(follower_id).await?;
        let followed = self.require_user(followed_id).await?;
        if followed.role != UserRole::ContentCreator {
            return Err(AppError::NotFound(format!(
                "No content creator with id {}",
                followed_id
            )));
        }

        let follow = self
            .repository
            .insert_follow(follower_id, followed_id)
            .await
            .map_err(|e| match e {
                StoreError::DuplicatePair => AppError::Conflict {
                    message: "Already following this creator".to_string(),
                    reason: ConflictReason::AlreadyFollowing,
                },
                other => other.into(),
            })?;

        info!("User {} now follows creator {}", follower_id, followed_id);
        self.events.publish(RelationshipEvent::CreatorFollowed {
            follow: follow.clone(),
        });

        Ok(())
    }

    /// Removing an absent edge is a no-op success; `is_following` is the
    /// caller's probe.
    pub async fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<(), AppError> {
        let removed = self
            .repository
            .delete_follow(follower_id, followed_id)
            .await?;
        if !removed {
            debug!(
                "Unfollow {} -> {} had no edge to remove",
                follower_id, followed_id
            );
        }

        Ok(())
    }

    pub async fn is_following(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<bool, AppError> {
        Ok(self
            .repository
            .follow_exists(follower_id, followed_id)
            .await?)
    }

    pub async fn count_followers(&self, user_id: Uuid) -> Result<i64, AppError> {
        Ok(self.repository.count_followers(user_id).await?)
    }

    async fn require_user(&self, user_id: Uuid) -> Result<UserProfile, AppError> {
        self.user_directory
            .lookup(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc::UnboundedReceiver;
    use uuid::Uuid;

    use crate::{
        external_services::user_directory::testing::{profile, StaticUserDirectory},
        repositories::memory::InMemoryRelationshipRepository,
        utils::errors::app_error::ConflictReason,
    };

    use super::*;

    struct Fixture {
        service: FollowService,
        events: UnboundedReceiver<RelationshipEvent>,
        dave: Uuid,
        carol: Uuid,
    }

    fn fixture() -> Fixture {
        let dave = Uuid::new_v4();
        let carol = Uuid::new_v4();
        let repository = Arc::new(InMemoryRelationshipRepository::new());
        let directory = Arc::new(StaticUserDirectory::new([
            profile(dave, "dave", UserRole::NormalUser),
            profile(carol, "carol", UserRole::ContentCreator),
        ]));
        let (publisher, events) = EventPublisher::channel();
        let service = FollowService::new(repository, directory, publisher);
        Fixture {
            service,
            events,
            dave,
            carol,
        }
    }

    #[tokio::test]
    async fn follow_creates_the_edge_and_publishes() {
        let mut fx = fixture();

        fx.service.follow(fx.dave, fx.carol).await.unwrap();

        assert!(fx.service.is_following(fx.dave, fx.carol).await.unwrap());
        assert_eq!(fx.service.count_followers(fx.carol).await.unwrap(), 1);

        match fx.events.try_recv().unwrap() {
            RelationshipEvent::CreatorFollowed { follow } => {
                assert_eq!(follow.follower_id, fx.dave);
                assert_eq!(follow.followed_id, fx.carol);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn following_yourself_is_rejected() {
        let fx = fixture();

        let result = fx.service.follow(fx.carol, fx.carol).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn following_a_non_creator_is_not_found() {
        let fx = fixture();

        let result = fx.service.follow(fx.carol, fx.dave).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn double_follow_conflicts() {
        let fx = fixture();
        fx.service.follow(fx.dave, fx.carol).await.unwrap();

        let again = fx.service.follow(fx.dave, fx.carol).await;

        match again {
            Err(AppError::Conflict { reason, .. }) => {
                assert_eq!(reason, ConflictReason::AlreadyFollowing)
            }
            other => panic!("expected a conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unfollow_removes_the_edge() {
        let fx = fixture();
        fx.service.follow(fx.dave, fx.carol).await.unwrap();

        fx.service.unfollow(fx.dave, fx.carol).await.unwrap();

        assert!(!fx.service.is_following(fx.dave, fx.carol).await.unwrap());
        assert_eq!(fx.service.count_followers(fx.carol).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unfollow_without_an_edge_is_a_no_op() {
        let fx = fixture();

        fx.service.unfollow(fx.dave, fx.carol).await.unwrap();
    }

    #[tokio::test]
    async fn follower_counts_track_the_edge_set() {
        let fx = fixture();
        fx.service.follow(fx.dave, fx.carol).await.unwrap();
        assert_eq!(fx.service.count_followers(fx.carol).await.unwrap(), 1);

        fx.service.unfollow(fx.dave, fx.carol).await.unwrap();
        assert_eq!(fx.service.count_followers(fx.carol).await.unwrap(), 0);
    }
}
