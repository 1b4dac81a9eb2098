use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    apis::api_models::{
        query::FriendStatusQuery,
        request::{CancelFriendRequestBody, RespondFriendRequestBody, SendFriendRequestBody, UnfriendBody},
        response::{FriendRequestResponse, FriendshipStatusResponse, ReceivedFriendRequestResponse},
    },
    models::users::UserResponse,
    utils::errors::{app_error::AppError, error_payload::ErrorPayload},
    AppState,
};

const TAG: &str = "friends";

/// Send a friend request
#[utoipa::path(
    post,
    tag = TAG,
    path = "/requests",
    operation_id = "sendFriendRequest",
    responses(
        (status = 201, description = "Friend request created", body = FriendRequestResponse),
        (status = 400, description = "Self-referential request", body = ErrorPayload),
        (status = 404, description = "Unknown sender or receiver", body = ErrorPayload),
        (status = 409, description = "Duplicate request or already friends", body = ErrorPayload),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    request_body = SendFriendRequestBody
)]
pub(super) async fn send_friend_request(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<SendFriendRequestBody>,
) -> Result<impl IntoResponse, AppError> {
    let created = app_state
        .friendship_service
        .send_request(body.sender_id, body.receiver_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(FriendRequestResponse::from(created)),
    ))
}

/// Accept or reject a received friend request
#[utoipa::path(
    post,
    tag = TAG,
    path = "/requests/{id}/respond",
    operation_id = "respondFriendRequest",
    responses(
        (status = 200, description = "Friend request updated", body = FriendRequestResponse),
        (status = 400, description = "Unknown action", body = ErrorPayload),
        (status = 401, description = "Actor is not the receiver", body = ErrorPayload),
        (status = 404, description = "No pending request", body = ErrorPayload),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    params(
        ("id" = Uuid, Path, description = "Friend request ID")
    ),
    request_body = RespondFriendRequestBody
)]
pub(super) async fn respond_friend_request(
    State(app_state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<RespondFriendRequestBody>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state
        .friendship_service
        .respond(request_id, body.actor_id, &body.action)
        .await?;
    Ok((StatusCode::OK, Json(FriendRequestResponse::from(updated))))
}

/// Cancel a sent friend request
#[utoipa::path(
    post,
    tag = TAG,
    path = "/requests/{id}/cancel",
    operation_id = "cancelFriendRequest",
    responses(
        (status = 200, description = "Friend request cancelled"),
        (status = 400, description = "Request is no longer pending", body = ErrorPayload),
        (status = 401, description = "Actor is not the sender", body = ErrorPayload),
        (status = 404, description = "Friend request not found", body = ErrorPayload),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    params(
        ("id" = Uuid, Path, description = "Friend request ID")
    ),
    request_body = CancelFriendRequestBody
)]
pub(super) async fn cancel_friend_request(
    State(app_state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<CancelFriendRequestBody>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .friendship_service
        .cancel(request_id, body.actor_id)
        .await?;
    Ok(StatusCode::OK)
}

/// End a friendship
#[utoipa::path(
    post,
    tag = TAG,
    path = "/unfriend",
    operation_id = "unfriend",
    responses(
        (status = 200, description = "Friendship ended"),
        (status = 404, description = "The users are not friends", body = ErrorPayload),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    request_body = UnfriendBody
)]
pub(super) async fn unfriend(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<UnfriendBody>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .friendship_service
        .unfriend(body.user_id, body.other_id)
        .await?;
    Ok(StatusCode::OK)
}

/// Pairwise friendship status from the viewer's side
#[utoipa::path(
    get,
    tag = TAG,
    path = "/status/{target_id}",
    operation_id = "getFriendStatus",
    responses(
        (status = 200, description = "Current status", body = FriendshipStatusResponse),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    params(
        ("target_id" = Uuid, Path, description = "User the viewer is asking about"),
        FriendStatusQuery
    )
)]
pub(super) async fn get_friend_status(
    State(app_state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
    Query(query): Query<FriendStatusQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = app_state
        .query_service
        .get_status(query.viewer_id, target_id)
        .await?;
    Ok((StatusCode::OK, Json(FriendshipStatusResponse { status })))
}

/// List a user's friends
#[utoipa::path(
    get,
    tag = TAG,
    path = "/{user_id}",
    operation_id = "getFriends",
    responses(
        (status = 200, description = "Friend summaries", body = Vec<UserResponse>),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    )
)]
pub(super) async fn get_friends(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let friends = app_state.query_service.list_friends(user_id).await?;
    Ok((StatusCode::OK, Json(friends)))
}

/// List pending friend requests addressed to a user
#[utoipa::path(
    get,
    tag = TAG,
    path = "/requests/pending/{user_id}",
    operation_id = "getPendingFriendRequests",
    responses(
        (status = 200, description = "Pending requests, newest first", body = Vec<ReceivedFriendRequestResponse>),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    params(
        ("user_id" = Uuid, Path, description = "Receiving user ID")
    )
)]
pub(super) async fn get_pending_received(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let pending = app_state
        .query_service
        .list_pending_received(user_id)
        .await?;
    Ok((StatusCode::OK, Json(pending)))
}

/// List every friend request a user has received
#[utoipa::path(
    get,
    tag = TAG,
    path = "/requests/received/{user_id}",
    operation_id = "getReceivedFriendRequests",
    responses(
        (status = 200, description = "Received requests, newest first", body = Vec<ReceivedFriendRequestResponse>),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    params(
        ("user_id" = Uuid, Path, description = "Receiving user ID")
    )
)]
pub(super) async fn get_all_received(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let received = app_state.query_service.list_all_received(user_id).await?;
    Ok((StatusCode::OK, Json(received)))
}
