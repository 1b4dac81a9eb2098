use async_trait::async_trait;
use chrono::Utc;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};
use uuid::Uuid;

use crate::models::{
    friend_requests::{FriendRequest, FriendRequestStatus},
    notifications::{NewNotification, Notification},
    user_follows::UserFollow,
};

use super::relationship_repository::{RelationshipRepository, StoreError};

/// In-memory stand-in for the Postgres repository. Enforces the same
/// pair-uniqueness rules at the insert boundary so the services see the
/// identical conflict signal they would get from the partial unique
/// index.
#[derive(Default)]
pub struct InMemoryRelationshipRepository {
    state: Mutex<State>,
    notifications_unavailable: AtomicBool,
}

#[derive(Default)]
struct State {
    requests: Vec<FriendRequest>,
    follows: Vec<UserFollow>,
    notifications: Vec<Notification>,
}

impl InMemoryRelationshipRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a notification-store outage; relationship tables keep
    /// working.
    pub fn set_notifications_unavailable(&self, unavailable: bool) {
        self.notifications_unavailable
            .store(unavailable, Ordering::SeqCst);
    }

    pub fn notifications_snapshot(&self) -> Vec<Notification> {
        self.state.lock().unwrap().notifications.clone()
    }

    fn active_pair_exists(state: &State, a: Uuid, b: Uuid) -> bool {
        state.requests.iter().any(|r| {
            matches!(
                r.status,
                FriendRequestStatus::Pending | FriendRequestStatus::Accepted
            ) && ((r.sender_id == a && r.receiver_id == b)
                || (r.sender_id == b && r.receiver_id == a))
        })
    }

    fn insert_pending(state: &mut State, sender_id: Uuid, receiver_id: Uuid) -> Result<FriendRequest, StoreError> {
        if Self::active_pair_exists(state, sender_id, receiver_id) {
            return Err(StoreError::DuplicatePair);
        }
        let now = Utc::now();
        let request = FriendRequest {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            status: FriendRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.requests.push(request.clone());
        Ok(request)
    }
}

#[async_trait]
impl RelationshipRepository for InMemoryRelationshipRepository {
    async fn find_request_by_id(&self, id: Uuid) -> Result<Option<FriendRequest>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn find_request_between(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> Result<Option<FriendRequest>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut candidates: Vec<&FriendRequest> = state
            .requests
            .iter()
            .filter(|r| {
                (r.sender_id == a && r.receiver_id == b)
                    || (r.sender_id == b && r.receiver_id == a)
            })
            .collect();
        candidates.sort_by_key(|r| r.updated_at);
        Ok(candidates.last().map(|r| (*r).clone()))
    }

    async fn insert_request(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<FriendRequest, StoreError> {
        let mut state = self.state.lock().unwrap();
        Self::insert_pending(&mut state, sender_id, receiver_id)
    }

    async fn replace_rejected_request(
        &self,
        stale_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<FriendRequest, StoreError> {
        let mut state = self.state.lock().unwrap();
        state
            .requests
            .retain(|r| !(r.id == stale_id && r.status == FriendRequestStatus::Rejected));
        Self::insert_pending(&mut state, sender_id, receiver_id)
    }

    async fn update_request_status(
        &self,
        id: Uuid,
        status: FriendRequestStatus,
    ) -> Result<FriendRequest, StoreError> {
        let mut state = self.state.lock().unwrap();
        let request = state
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        request.status = status;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn delete_request(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.requests.retain(|r| r.id != id);
        Ok(())
    }

    async fn list_accepted_for(&self, user_id: Uuid) -> Result<Vec<FriendRequest>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut accepted: Vec<FriendRequest> = state
            .requests
            .iter()
            .filter(|r| {
                r.status == FriendRequestStatus::Accepted
                    && (r.sender_id == user_id || r.receiver_id == user_id)
            })
            .cloned()
            .collect();
        accepted.sort_by_key(|r| std::cmp::Reverse(r.updated_at));
        Ok(accepted)
    }

    async fn list_received(
        &self,
        receiver_id: Uuid,
        pending_only: bool,
    ) -> Result<Vec<FriendRequest>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut received: Vec<FriendRequest> = state
            .requests
            .iter()
            .filter(|r| {
                r.receiver_id == receiver_id
                    && (!pending_only || r.status == FriendRequestStatus::Pending)
            })
            .cloned()
            .collect();
        received.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        Ok(received)
    }

    async fn insert_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<UserFollow, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.followed_id == followed_id)
        {
            return Err(StoreError::DuplicatePair);
        }
        let follow = UserFollow {
            id: Uuid::new_v4(),
            follower_id,
            followed_id,
            created_at: Utc::now(),
        };
        state.follows.push(follow.clone());
        Ok(follow)
    }

    async fn delete_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        let before = state.follows.len();
        state
            .follows
            .retain(|f| !(f.follower_id == follower_id && f.followed_id == followed_id));
        Ok(state.follows.len() < before)
    }

    async fn follow_exists(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<bool, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.followed_id == followed_id))
    }

    async fn count_followers(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .follows
            .iter()
            .filter(|f| f.followed_id == user_id)
            .count() as i64)
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError> {
        if self.notifications_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::Protocol(
                "notification store unavailable".into(),
            )));
        }
        let mut state = self.state.lock().unwrap();
        let created = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            notification_type: notification.notification_type,
            title: notification.title,
            message: notification.message,
            related_id: notification.related_id,
            is_read: false,
            created_at: Utc::now(),
        };
        state.notifications.push(created.clone());
        Ok(created)
    }

    async fn list_notifications_for(&self, user_id: Uuid) -> Result<Vec<Notification>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut notifications: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by_key(|n| std::cmp::Reverse(n.created_at));
        Ok(notifications)
    }

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
