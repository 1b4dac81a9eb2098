use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    apis::api_models::{
        request::MarkNotificationReadBody,
        response::{NotificationResponse, UnreadCountResponse},
    },
    utils::errors::{app_error::AppError, error_payload::ErrorPayload},
    AppState,
};

const TAG: &str = "notifications";

/// List a user's notifications, newest first
#[utoipa::path(
    get,
    tag = TAG,
    path = "/user/{user_id}",
    operation_id = "getNotifications",
    responses(
        (status = 200, description = "Notification feed", body = Vec<NotificationResponse>),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    params(
        ("user_id" = Uuid, Path, description = "Addressee user ID")
    )
)]
pub(super) async fn get_notifications(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let notifications = app_state.notification_service.list_for_user(user_id).await?;
    let feed: Vec<NotificationResponse> = notifications
        .into_iter()
        .map(NotificationResponse::from)
        .collect();
    Ok((StatusCode::OK, Json(feed)))
}

/// Count a user's unread notifications
#[utoipa::path(
    get,
    tag = TAG,
    path = "/user/{user_id}/unread-count",
    operation_id = "getUnreadNotificationCount",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    params(
        ("user_id" = Uuid, Path, description = "Addressee user ID")
    )
)]
pub(super) async fn get_unread_count(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let unread = app_state.notification_service.unread_count(user_id).await?;
    Ok((StatusCode::OK, Json(UnreadCountResponse { unread })))
}

/// Mark a notification as read
#[utoipa::path(
    post,
    tag = TAG,
    path = "/{id}/read",
    operation_id = "markNotificationRead",
    responses(
        (status = 200, description = "Notification marked as read"),
        (status = 404, description = "No such notification for this user", body = ErrorPayload),
        (status = 500, description = "Internal server error", body = ErrorPayload)
    ),
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    request_body = MarkNotificationReadBody
)]
pub(super) async fn mark_notification_read(
    State(app_state): State<Arc<AppState>>,
    Path(notification_id): Path<Uuid>,
    Json(body): Json<MarkNotificationReadBody>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .notification_service
        .mark_read(notification_id, body.user_id)
        .await?;
    Ok(StatusCode::OK)
}
