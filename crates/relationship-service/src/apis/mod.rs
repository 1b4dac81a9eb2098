use std::sync::Arc;

use axum::Router;
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_scalar::{Scalar, Servable};

use crate::AppState;

pub mod api_models;
pub mod follow_handlers;
pub mod friend_handlers;
pub mod notification_handlers;

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "friends", description = "Friend request and friendship API"),
        (name = "users", description = "Creator follow API"),
        (name = "notifications", description = "Notification feed API")
    )
)]
pub struct ApiDoc;

pub fn setup_routes() -> Router<Arc<AppState>> {
    let api_doc = ApiDoc::openapi();

    let friend_router = OpenApiRouter::new()
        .routes(routes!(friend_handlers::send_friend_request))
        .routes(routes!(friend_handlers::respond_friend_request))
        .routes(routes!(friend_handlers::cancel_friend_request))
        .routes(routes!(friend_handlers::unfriend))
        .routes(routes!(friend_handlers::get_friend_status))
        .routes(routes!(friend_handlers::get_pending_received))
        .routes(routes!(friend_handlers::get_all_received))
        .routes(routes!(friend_handlers::get_friends));

    let user_router = OpenApiRouter::new()
        .routes(routes!(follow_handlers::follow_user))
        .routes(routes!(follow_handlers::unfollow_user))
        .routes(routes!(follow_handlers::is_following))
        .routes(routes!(follow_handlers::get_follower_count));

    let notification_router = OpenApiRouter::new()
        .routes(routes!(notification_handlers::get_notifications))
        .routes(routes!(notification_handlers::get_unread_count))
        .routes(routes!(notification_handlers::mark_notification_read));

    let friend_router =
        OpenApiRouter::with_openapi(api_doc.clone()).nest("/friends", friend_router);
    let user_router = OpenApiRouter::with_openapi(api_doc.clone()).nest("/users", user_router);
    let notification_router =
        OpenApiRouter::with_openapi(api_doc.clone()).nest("/notifications", notification_router);

    let router = OpenApiRouter::new()
        .merge(friend_router)
        .merge(user_router)
        .merge(notification_router);

    let (api_router, api_openapi) = OpenApiRouter::new()
        .nest("/api/v1", router)
        .split_for_parts();

    Router::new()
        .merge(Scalar::with_url("/docs", api_openapi))
        .merge(api_router)
}
