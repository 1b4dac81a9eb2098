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
        query::IsFollowingQuery,
        request::FollowUnfollowUserBody,
        response::{FollowerCountResponse, IsFollowingResponse},
    },
    utils::errors::{app_error::AppError, error_payload::ErrorPayload},
    AppState,
};

const TAG: &str = "users";

/// Follow a content creator
#[utoipa::path(
    post,
    tag = TAG,
    path = "/{id}/follow",
    operation_id = "followUser",
    responses(
        (status = 200, description = "Creator followed successfully"),
        (status = 400, description = "Self-referential follow", body = ErrorPayload),
        (status = 404, description = "Unknown user or not a creator", body = ErrorPayload),
        (status = 409, description = "Already following", body = ErrorPayload),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    params(
        ("id" = Uuid, Path, description = "Creator ID to follow")
    ),
    request_body = FollowUnfollowUserBody
)]
pub(super) async fn follow_user(
    State(app_state): State<Arc<AppState>>,
    Path(followed_id): Path<Uuid>,
    Json(body): Json<FollowUnfollowUserBody>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .follow_service
        .follow(body.follower_id, followed_id)
        .await?;
    Ok(StatusCode::OK)
}

/// Unfollow a content creator
#[utoipa::path(
    post,
    tag = TAG,
    path = "/{id}/unfollow",
    operation_id = "unfollowUser",
    responses(
        (status = 200, description = "Creator unfollowed (or was not followed)"),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    params(
        ("id" = Uuid, Path, description = "Creator ID to unfollow")
    ),
    request_body = FollowUnfollowUserBody
)]
pub(super) async fn unfollow_user(
    State(app_state): State<Arc<AppState>>,
    Path(followed_id): Path<Uuid>,
    Json(body): Json<FollowUnfollowUserBody>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .follow_service
        .unfollow(body.follower_id, followed_id)
        .await?;
    Ok(StatusCode::OK)
}

/// Whether a user follows a creator
#[utoipa::path(
    get,
    tag = TAG,
    path = "/{id}/is-following",
    operation_id = "isFollowing",
    responses(
        (status = 200, description = "Follow state", body = IsFollowingResponse),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    params(
        ("id" = Uuid, Path, description = "Creator ID"),
        IsFollowingQuery
    )
)]
pub(super) async fn is_following(
    State(app_state): State<Arc<AppState>>,
    Path(followed_id): Path<Uuid>,
    Query(query): Query<IsFollowingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let is_following = app_state
        .follow_service
        .is_following(query.follower_id, followed_id)
        .await?;
    Ok((StatusCode::OK, Json(IsFollowingResponse { is_following })))
}

/// Follower count of a user
#[utoipa::path(
    get,
    tag = TAG,
    path = "/{id}/followers/count",
    operation_id = "getFollowerCount",
    responses(
        (status = 200, description = "Follower count", body = FollowerCountResponse),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    params(
        ("id" = Uuid, Path, description = "User ID")
    )
)]
pub(super) async fn get_follower_count(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let followers = app_state.follow_service.count_followers(user_id).await?;
    Ok((StatusCode::OK, Json(FollowerCountResponse { followers })))
}
