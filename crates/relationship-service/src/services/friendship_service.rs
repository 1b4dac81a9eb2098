use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    events::{types::RelationshipEvent, EventPublisher},
    external_services::user_directory::UserDirectory,
    models::{
        friend_requests::{FriendRequest, FriendRequestStatus},
        users::UserProfile,
    },
    repositories::relationship_repository::{RelationshipRepository, StoreError},
    utils::errors::app_error::{AppError, ConflictReason},
};

/// The friendship state machine. Every mutation of a friend-request
/// edge goes through here; reads live in the query service.
///
/// States: no edge -> pending -> accepted or rejected. A rejected edge
/// is superseded by the next send between the same pair; cancel removes
/// a pending edge outright; unfriend demotes an accepted edge back to
/// rejected.
#[derive(Clone)]
pub struct FriendshipService {
    repository: Arc<dyn RelationshipRepository>,
    user_directory: Arc<dyn UserDirectory>,
    events: EventPublisher,
}

impl FriendshipService {
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

    pub async fn send_request(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<FriendRequest, AppError> {
        if sender_id == receiver_id {
            return Err(AppError::BadRequest(
                "Cannot send a friend request to yourself".to_string(),
            ));
        }

        self.require_user(sender_id).await?;
        self.require_user(receiver_id).await?;

        // The pre-check gives friendly conflicts for the common cases; the
        // storage pair key stays authoritative when two opposite-direction
        // sends race past it.
        let existing = self
            .repository
            .find_request_between(sender_id, receiver_id)
            .await?;
        let created = match existing {
            Some(request) if request.status == FriendRequestStatus::Pending => {
                return Err(AppError::Conflict {
                    message: "A friend request between these users is already pending".to_string(),
                    reason: ConflictReason::DuplicateRequest,
                });
            }
            Some(request) if request.status == FriendRequestStatus::Accepted => {
                return Err(AppError::Conflict {
                    message: "These users are already friends".to_string(),
                    reason: ConflictReason::AlreadyFriends,
                });
            }
            Some(stale) => {
                self.repository
                    .replace_rejected_request(stale.id, sender_id, receiver_id)
                    .await
            }
            None => self.repository.insert_request(sender_id, receiver_id).await,
        }
        .map_err(Self::pair_conflict_to_duplicate)?;

        info!(
            "Friend request {} created: {} -> {}",
            created.id, sender_id, receiver_id
        );
        self.events.publish(RelationshipEvent::FriendRequestSent {
            request: created.clone(),
        });

        Ok(created)
    }

    pub async fn respond(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        action: &str,
    ) -> Result<FriendRequest, AppError> {
        let status = match action {
            "accept" => FriendRequestStatus::Accepted,
            "reject" => FriendRequestStatus::Rejected,
            other => {
                return Err(AppError::BadRequest(format!(
                    "Unknown response action: {}",
                    other
                )))
            }
        };

        let request = self
            .repository
            .find_request_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Friend request {} not found", request_id)))?;

        if request.receiver_id != actor_id {
            return Err(AppError::Unauthorized(
                "Only the receiver of a friend request can respond to it".to_string(),
            ));
        }
        if request.status != FriendRequestStatus::Pending {
            return Err(AppError::NotFound(format!(
                "No pending friend request {} addressed to this user",
                request_id
            )));
        }

        let updated = self
            .repository
            .update_request_status(request.id, status)
            .await?;

        info!("Friend request {} {}ed by {}", updated.id, action, actor_id);
        self.events
            .publish(RelationshipEvent::FriendRequestResponded {
                request: updated.clone(),
                accepted: status == FriendRequestStatus::Accepted,
            });

        Ok(updated)
    }

    pub async fn cancel(&self, request_id: Uuid, actor_id: Uuid) -> Result<(), AppError> {
        let request = self
            .repository
            .find_request_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Friend request {} not found", request_id)))?;

        if request.sender_id != actor_id {
            return Err(AppError::Unauthorized(
                "Only the sender of a friend request can cancel it".to_string(),
            ));
        }
        if request.status != FriendRequestStatus::Pending {
            return Err(AppError::BadRequest(
                "Only a pending friend request can be cancelled".to_string(),
            ));
        }

        self.repository.delete_request(request.id).await?;
        Ok(())
    }

    pub async fn unfriend(&self, user_id: Uuid, other_id: Uuid) -> Result<(), AppError> {
        if user_id == other_id {
            return Err(AppError::BadRequest(
                "Cannot unfriend yourself".to_string(),
            ));
        }

        let request = self
            .repository
            .find_request_between(user_id, other_id)
            .await?
            .filter(|r| r.status == FriendRequestStatus::Accepted)
            .ok_or_else(|| AppError::NotFound("These users are not friends".to_string()))?;

        // Soft removal: the rejected row keeps the supersede-on-resend
        // rule in play instead of leaving the pair with no history.
        self.repository
            .update_request_status(request.id, FriendRequestStatus::Rejected)
            .await?;

        Ok(())
    }

    fn pair_conflict_to_duplicate(e: StoreError) -> AppError {
        match e {
            StoreError::DuplicatePair => AppError::Conflict {
                message: "A friend request between these users is already pending".to_string(),
                reason: ConflictReason::DuplicateRequest,
            },
            other => other.into(),
        }
    }

    async fn require_user(&self, user_id: Uuid) -> Result<UserProfile, AppError> {
        self.user_directory
            .lookup(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }
}
