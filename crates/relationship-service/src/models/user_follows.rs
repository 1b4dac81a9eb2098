use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Follow edge from a user to a content creator. Existence is the whole
/// state; there is no status column.
#[derive(Clone, Debug, PartialEq, FromRow, Serialize, Deserialize)]
pub struct UserFollow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub followed_id: Uuid,
    pub created_at: DateTime<Utc>,
}
