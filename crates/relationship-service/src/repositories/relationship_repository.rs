use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    friend_requests::{FriendRequest, FriendRequestStatus},
    notifications::{NewNotification, Notification},
    user_follows::UserFollow,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique-constraint hit on a relationship pair. This is the
    /// authoritative signal that a concurrent writer committed first;
    /// callers map it to a conflict, never retry it.
    #[error("an active relationship already exists for this pair")]
    DuplicatePair,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

fn map_pair_conflict(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicatePair,
        _ => StoreError::Database(e),
    }
}

/// Persistence seam for friend-request edges, follow edges and
/// notifications. Injected into the services so they can run against an
/// in-memory implementation in tests.
#[async_trait]
pub trait RelationshipRepository: Send + Sync {
    async fn find_request_by_id(&self, id: Uuid) -> Result<Option<FriendRequest>, StoreError>;

    /// Latest edge between the unordered pair, matching either
    /// sender/receiver ordering.
    async fn find_request_between(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> Result<Option<FriendRequest>, StoreError>;

    async fn insert_request(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<FriendRequest, StoreError>;

    /// Deletes a stale rejected edge and inserts a fresh pending one in
    /// a single transaction, so the pair never holds two rows.
    async fn replace_rejected_request(
        &self,
        stale_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<FriendRequest, StoreError>;

    async fn update_request_status(
        &self,
        id: Uuid,
        status: FriendRequestStatus,
    ) -> Result<FriendRequest, StoreError>;

    async fn delete_request(&self, id: Uuid) -> Result<(), StoreError>;

    async fn list_accepted_for(&self, user_id: Uuid) -> Result<Vec<FriendRequest>, StoreError>;

    /// Edges addressed to `receiver_id`, newest first.
    async fn list_received(
        &self,
        receiver_id: Uuid,
        pending_only: bool,
    ) -> Result<Vec<FriendRequest>, StoreError>;

    async fn insert_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<UserFollow, StoreError>;

    /// Returns whether an edge was actually removed.
    async fn delete_follow(&self, follower_id: Uuid, followed_id: Uuid)
        -> Result<bool, StoreError>;

    async fn follow_exists(&self, follower_id: Uuid, followed_id: Uuid)
        -> Result<bool, StoreError>;

    async fn count_followers(&self, user_id: Uuid) -> Result<i64, StoreError>;

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError>;

    async fn list_notifications_for(&self, user_id: Uuid) -> Result<Vec<Notification>, StoreError>;

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, StoreError>;

    /// Returns whether a row owned by `user_id` was updated.
    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, StoreError>;
}

pub struct PgRelationshipRepository {
    db: Arc<PgPool>,
}

impl PgRelationshipRepository {
    pub fn new(db: Arc<PgPool>) -> Self {
        PgRelationshipRepository { db }
    }
}

#[async_trait]
impl RelationshipRepository for PgRelationshipRepository {
    async fn find_request_by_id(&self, id: Uuid) -> Result<Option<FriendRequest>, StoreError> {
        let request = sqlx::query_as::<_, FriendRequest>(
            "SELECT * FROM social.friend_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.db.as_ref())
        .await?;

        Ok(request)
    }

    async fn find_request_between(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> Result<Option<FriendRequest>, StoreError> {
        let query = r#"
        SELECT *
        FROM social.friend_requests
        WHERE (sender_id = $1 AND receiver_id = $2)
           OR (sender_id = $2 AND receiver_id = $1)
        ORDER BY updated_at DESC
        LIMIT 1
        "#;
        let request = sqlx::query_as::<_, FriendRequest>(query)
            .bind(a)
            .bind(b)
            .fetch_optional(self.db.as_ref())
            .await?;

        Ok(request)
    }

    async fn insert_request(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<FriendRequest, StoreError> {
        let query = r#"
        INSERT INTO social.friend_requests (id, sender_id, receiver_id, status, created_at, updated_at)
        VALUES ($1, $2, $3, 'pending', $4, $4)
        RETURNING *
        "#;
        sqlx::query_as::<_, FriendRequest>(query)
            .bind(Uuid::new_v4())
            .bind(sender_id)
            .bind(receiver_id)
            .bind(Utc::now())
            .fetch_one(self.db.as_ref())
            .await
            .map_err(map_pair_conflict)
    }

    async fn replace_rejected_request(
        &self,
        stale_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<FriendRequest, StoreError> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM social.friend_requests WHERE id = $1 AND status = 'rejected'")
            .bind(stale_id)
            .execute(&mut *tx)
            .await?;

        let query = r#"
        INSERT INTO social.friend_requests (id, sender_id, receiver_id, status, created_at, updated_at)
        VALUES ($1, $2, $3, 'pending', $4, $4)
        RETURNING *
        "#;
        let created = sqlx::query_as::<_, FriendRequest>(query)
            .bind(Uuid::new_v4())
            .bind(sender_id)
            .bind(receiver_id)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_pair_conflict)?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update_request_status(
        &self,
        id: Uuid,
        status: FriendRequestStatus,
    ) -> Result<FriendRequest, StoreError> {
        let query = r#"
        UPDATE social.friend_requests
        SET status = $2, updated_at = $3
        WHERE id = $1
        RETURNING *
        "#;
        let updated = sqlx::query_as::<_, FriendRequest>(query)
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .fetch_one(self.db.as_ref())
            .await?;

        Ok(updated)
    }

    async fn delete_request(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM social.friend_requests WHERE id = $1")
            .bind(id)
            .execute(self.db.as_ref())
            .await?;

        Ok(())
    }

    async fn list_accepted_for(&self, user_id: Uuid) -> Result<Vec<FriendRequest>, StoreError> {
        let query = r#"
        SELECT *
        FROM social.friend_requests
        WHERE status = 'accepted' AND (sender_id = $1 OR receiver_id = $1)
        ORDER BY updated_at DESC
        "#;
        let requests = sqlx::query_as::<_, FriendRequest>(query)
            .bind(user_id)
            .fetch_all(self.db.as_ref())
            .await?;

        Ok(requests)
    }

    async fn list_received(
        &self,
        receiver_id: Uuid,
        pending_only: bool,
    ) -> Result<Vec<FriendRequest>, StoreError> {
        let query = if pending_only {
            r#"
            SELECT *
            FROM social.friend_requests
            WHERE receiver_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            "#
        } else {
            r#"
            SELECT *
            FROM social.friend_requests
            WHERE receiver_id = $1
            ORDER BY created_at DESC
            "#
        };
        let requests = sqlx::query_as::<_, FriendRequest>(query)
            .bind(receiver_id)
            .fetch_all(self.db.as_ref())
            .await?;

        Ok(requests)
    }

    async fn insert_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<UserFollow, StoreError> {
        let query = r#"
        INSERT INTO social.user_follows (id, follower_id, followed_id, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#;
        sqlx::query_as::<_, UserFollow>(query)
            .bind(Uuid::new_v4())
            .bind(follower_id)
            .bind(followed_id)
            .bind(Utc::now())
            .fetch_one(self.db.as_ref())
            .await
            .map_err(map_pair_conflict)
    }

    async fn delete_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM social.user_follows WHERE follower_id = $1 AND followed_id = $2")
                .bind(follower_id)
                .bind(followed_id)
                .execute(self.db.as_ref())
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn follow_exists(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<bool, StoreError> {
        let query = r#"
        SELECT EXISTS (SELECT 1 FROM social.user_follows WHERE follower_id = $1 AND followed_id = $2)
        "#;
        let exists = sqlx::query_scalar::<_, bool>(query)
            .bind(follower_id)
            .bind(followed_id)
            .fetch_one(self.db.as_ref())
            .await?;

        Ok(exists)
    }

    async fn count_followers(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM social.user_follows WHERE followed_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.db.as_ref())
        .await?;

        Ok(count)
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError> {
        let query = r#"
        INSERT INTO social.notifications (id, user_id, notification_type, title, message, related_id, is_read, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
        RETURNING *
        "#;
        let created = sqlx::query_as::<_, Notification>(query)
            .bind(Uuid::new_v4())
            .bind(notification.user_id)
            .bind(notification.notification_type)
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.related_id)
            .bind(Utc::now())
            .fetch_one(self.db.as_ref())
            .await?;

        Ok(created)
    }

    async fn list_notifications_for(&self, user_id: Uuid) -> Result<Vec<Notification>, StoreError> {
        let query = r#"
        SELECT *
        FROM social.notifications
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#;
        let notifications = sqlx::query_as::<_, Notification>(query)
            .bind(user_id)
            .fetch_all(self.db.as_ref())
            .await?;

        Ok(notifications)
    }

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM social.notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(self.db.as_ref())
        .await?;

        Ok(count)
    }

    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE social.notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(self.db.as_ref())
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
