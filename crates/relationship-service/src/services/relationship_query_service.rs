use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::{
    apis::api_models::response::ReceivedFriendRequestResponse,
    external_services::user_directory::UserDirectory,
    models::{
        friend_requests::{FriendRequest, FriendRequestStatus, FriendshipStatus},
        users::UserResponse,
    },
    repositories::relationship_repository::RelationshipRepository,
    utils::errors::app_error::AppError,
};

/// Read views over the relationship store. Everything here is derived
/// live from the friend_requests and user_follows rows; there is no
/// materialized friendship table and notifications are never consulted.
#[derive(Clone)]
pub struct RelationshipQueryService {
    repository: Arc<dyn RelationshipRepository>,
    user_directory: Arc<dyn UserDirectory>,
}

impl RelationshipQueryService {
    pub fn new(
        repository: Arc<dyn RelationshipRepository>,
        user_directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            repository,
            user_directory,
        }
    }

    pub async fn get_status(
        &self,
        viewer_id: Uuid,
        target_id: Uuid,
    ) -> Result<FriendshipStatus, AppError> {
        if viewer_id == target_id {
            return Ok(FriendshipStatus::CurrentUser);
        }

        let status = match self
            .repository
            .find_request_between(viewer_id, target_id)
            .await?
        {
            Some(r) if r.status == FriendRequestStatus::Accepted => FriendshipStatus::Friends,
            Some(r) if r.status == FriendRequestStatus::Pending && r.sender_id == viewer_id => {
                FriendshipStatus::PendingSent
            }
            Some(r) if r.status == FriendRequestStatus::Pending => FriendshipStatus::PendingReceived,
            _ => FriendshipStatus::None,
        };

        Ok(status)
    }

    pub async fn list_friends(&self, user_id: Uuid) -> Result<Vec<UserResponse>, AppError> {
        let accepted = self.repository.list_accepted_for(user_id).await?;

        let mut friends = Vec::with_capacity(accepted.len());
        for request in accepted {
            let friend_id = request.counterpart_of(user_id);
            match self.user_directory.lookup(friend_id).await? {
                Some(profile) => friends.push(UserResponse::from(profile)),
                None => warn!(
                    "Friend {} of {} is missing from the user directory",
                    friend_id, user_id
                ),
            }
        }

        Ok(friends)
    }

    pub async fn list_pending_received(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ReceivedFriendRequestResponse>, AppError> {
        let requests = self.repository.list_received(user_id, true).await?;
        self.with_sender_summaries(requests).await
    }

    pub async fn list_all_received(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ReceivedFriendRequestResponse>, AppError> {
        let requests = self.repository.list_received(user_id, false).await?;
        self.with_sender_summaries(requests).await
    }

    async fn with_sender_summaries(
        &self,
        requests: Vec<FriendRequest>,
    ) -> Result<Vec<ReceivedFriendRequestResponse>, AppError> {
        let mut out = Vec::with_capacity(requests.len());
        for request in requests {
            let sender = self.user_directory.lookup(request.sender_id).await?;
            out.push(ReceivedFriendRequestResponse::new(
                request,
                sender.map(UserResponse::from),
            ));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use crate::{
        events::EventPublisher,
        external_services::user_directory::testing::{profile, StaticUserDirectory},
        models::users::UserRole,
        repositories::memory::InMemoryRelationshipRepository,
        services::{
            follow_service::FollowService, friendship_service::FriendshipService,
            notification_service::NotificationService,
        },
    };

    use super::*;

    /// Everything wired together against the in-memory store, the way
    /// the router assembles it at startup.
    struct Fixture {
        friendships: FriendshipService,
        follows: FollowService,
        queries: RelationshipQueryService,
        notifications: Arc<NotificationService>,
        events: tokio::sync::mpsc::UnboundedReceiver<crate::events::types::RelationshipEvent>,
        repository: Arc<InMemoryRelationshipRepository>,
        alice: Uuid,
        bob: Uuid,
        carol: Uuid,
        dave: Uuid,
    }

    fn fixture() -> Fixture {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();
        let dave = Uuid::new_v4();
        let repository = Arc::new(InMemoryRelationshipRepository::new());
        let directory = Arc::new(StaticUserDirectory::new([
            profile(alice, "alice", UserRole::NormalUser),
            profile(bob, "bob", UserRole::NormalUser),
            profile(carol, "carol", UserRole::ContentCreator),
            profile(dave, "dave", UserRole::NormalUser),
        ]));
        let (publisher, events) = EventPublisher::channel();

        let repo: Arc<dyn RelationshipRepository> = repository.clone();
        let dir: Arc<dyn UserDirectory> = directory;
        Fixture {
            friendships: FriendshipService::new(repo.clone(), dir.clone(), publisher.clone()),
            follows: FollowService::new(repo.clone(), dir.clone(), publisher),
            queries: RelationshipQueryService::new(repo.clone(), dir.clone()),
            notifications: Arc::new(NotificationService::new(repo, dir)),
            events,
            repository,
            alice,
            bob,
            carol,
            dave,
        }
    }

    #[tokio::test]
    async fn status_is_self_for_equal_ids() {
        let fx = fixture();

        let status = fx.queries.get_status(fx.alice, fx.alice).await.unwrap();

        assert_eq!(status, FriendshipStatus::CurrentUser);
    }

    #[tokio::test]
    async fn status_tracks_the_request_direction() {
        let fx = fixture();
        fx.friendships.send_request(fx.alice, fx.bob).await.unwrap();

        assert_eq!(
            fx.queries.get_status(fx.alice, fx.bob).await.unwrap(),
            FriendshipStatus::PendingSent
        );
        assert_eq!(
            fx.queries.get_status(fx.bob, fx.alice).await.unwrap(),
            FriendshipStatus::PendingReceived
        );
    }

    #[tokio::test]
    async fn status_is_none_after_a_rejection() {
        let fx = fixture();
        let request = fx.friendships.send_request(fx.alice, fx.bob).await.unwrap();
        fx.friendships.respond(request.id, fx.bob, "reject").await.unwrap();

        assert_eq!(
            fx.queries.get_status(fx.alice, fx.bob).await.unwrap(),
            FriendshipStatus::None
        );
        assert_eq!(
            fx.queries.get_status(fx.bob, fx.alice).await.unwrap(),
            FriendshipStatus::None
        );
    }

    #[tokio::test]
    async fn received_lists_are_newest_first_and_annotated() {
        let fx = fixture();
        let from_alice = fx.friendships.send_request(fx.alice, fx.bob).await.unwrap();
        let from_dave = fx.friendships.send_request(fx.dave, fx.bob).await.unwrap();
        fx.friendships
            .respond(from_alice.id, fx.bob, "reject")
            .await
            .unwrap();

        let pending = fx.queries.list_pending_received(fx.bob).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, from_dave.id);
        assert_eq!(
            pending[0].sender.as_ref().unwrap().username,
            "dave".to_string()
        );

        let all = fx.queries.list_all_received(fx.bob).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, from_dave.id);
        assert_eq!(all[1].id, from_alice.id);
        assert_eq!(
            all[1].sender.as_ref().unwrap().username,
            "alice".to_string()
        );
    }

    // "alice" asks "bob"; bob sees it pending, accepts; both sides agree.
    #[tokio::test]
    async fn friendship_end_to_end() {
        let fx = fixture();

        let request = fx.friendships.send_request(fx.alice, fx.bob).await.unwrap();

        let pending = fx.queries.list_pending_received(fx.bob).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, request.id);

        fx.friendships
            .respond(request.id, fx.bob, "accept")
            .await
            .unwrap();

        let bobs_friends = fx.queries.list_friends(fx.bob).await.unwrap();
        let alices_friends = fx.queries.list_friends(fx.alice).await.unwrap();
        assert_eq!(bobs_friends.len(), 1);
        assert_eq!(bobs_friends[0].id, fx.alice);
        assert_eq!(alices_friends.len(), 1);
        assert_eq!(alices_friends[0].id, fx.bob);

        assert_eq!(
            fx.queries.get_status(fx.alice, fx.bob).await.unwrap(),
            FriendshipStatus::Friends
        );
        assert_eq!(
            fx.queries.get_status(fx.bob, fx.alice).await.unwrap(),
            FriendshipStatus::Friends
        );
    }

    #[tokio::test]
    async fn follow_end_to_end() {
        let fx = fixture();

        fx.follows.follow(fx.dave, fx.carol).await.unwrap();
        assert_eq!(fx.follows.count_followers(fx.carol).await.unwrap(), 1);

        fx.follows.unfollow(fx.dave, fx.carol).await.unwrap();
        assert_eq!(fx.follows.count_followers(fx.carol).await.unwrap(), 0);
    }

    // A notification-store outage during an accept must not touch the
    // accepted edge; only the feed entry is lost.
    #[tokio::test]
    async fn accept_survives_a_notification_outage() {
        let mut fx = fixture();
        let request = fx.friendships.send_request(fx.alice, fx.bob).await.unwrap();
        fx.events.try_recv().unwrap();

        fx.repository.set_notifications_unavailable(true);
        fx.friendships
            .respond(request.id, fx.bob, "accept")
            .await
            .unwrap();

        let responded = fx.events.try_recv().unwrap();
        let fanout = fx.notifications.handle_event(&responded).await;
        assert!(fanout.is_err());

        assert_eq!(
            fx.queries.get_status(fx.alice, fx.bob).await.unwrap(),
            FriendshipStatus::Friends
        );
        assert!(fx.repository.notifications_snapshot().is_empty());
    }
}
