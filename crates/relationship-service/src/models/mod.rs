pub mod friend_requests;
pub mod notifications;
pub mod user_follows;
pub mod users;
