use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    friend_requests::{FriendRequest, FriendRequestStatus, FriendshipStatus},
    notifications::{Notification, NotificationType},
    users::UserResponse,
};

#[derive(Serialize, ToSchema, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FriendRequest> for FriendRequestResponse {
    fn from(request: FriendRequest) -> Self {
        FriendRequestResponse {
            id: request.id,
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            status: request.status,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

/// A received request annotated with the sender's directory summary.
/// The summary is optional: a sender the directory no longer knows
/// still shows up as a bare edge.
#[derive(Serialize, ToSchema, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedFriendRequestResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender: Option<UserResponse>,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReceivedFriendRequestResponse {
    pub fn new(request: FriendRequest, sender: Option<UserResponse>) -> Self {
        ReceivedFriendRequestResponse {
            id: request.id,
            sender_id: request.sender_id,
            sender,
            status: request.status,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema, Clone, Copy, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FriendshipStatusResponse {
    pub status: FriendshipStatus,
}

#[derive(Serialize, ToSchema, Clone, Copy, Debug)]
#[serde(rename_all = "camelCase")]
pub struct IsFollowingResponse {
    pub is_following: bool,
}

#[derive(Serialize, ToSchema, Clone, Copy, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FollowerCountResponse {
    pub followers: i64,
}

#[derive(Serialize, ToSchema, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        NotificationResponse {
            id: notification.id,
            notification_type: notification.notification_type,
            title: notification.title,
            message: notification.message,
            related_id: notification.related_id,
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Serialize, ToSchema, Clone, Copy, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub unread: i64,
}
