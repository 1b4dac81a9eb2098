use crate::models::{friend_requests::FriendRequest, user_follows::UserFollow};

/// A committed relationship transition, published for notification
/// fan-out. Carries the written rows so consumers never re-read primary
/// state to interpret the event.
#[derive(Debug, Clone)]
pub enum RelationshipEvent {
    FriendRequestSent {
        request: FriendRequest,
    },
    FriendRequestResponded {
        request: FriendRequest,
        accepted: bool,
    },
    CreatorFollowed {
        follow: UserFollow,
    },
}
