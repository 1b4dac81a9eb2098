use std::sync::Arc;

use apis::setup_routes;
use axum::Router;
use events::EventPublisher;
use external_services::user_directory::{HttpUserDirectory, UserDirectory};
use repositories::relationship_repository::{PgRelationshipRepository, RelationshipRepository};
use services::{
    follow_service::FollowService, friendship_service::FriendshipService,
    notification_service::NotificationService,
    relationship_query_service::RelationshipQueryService,
};
use sqlx::postgres::PgPool;
use tower_http::cors::CorsLayer;

pub mod apis;
pub mod events;
pub mod external_services;
pub mod models;
pub mod repositories;
pub mod services;
pub mod settings;
pub mod utils;

pub struct AppState {
    pub friendship_service: Arc<FriendshipService>,
    pub follow_service: Arc<FollowService>,
    pub query_service: Arc<RelationshipQueryService>,
    pub notification_service: Arc<NotificationService>,
}

pub async fn setup_database(database_url: &str) -> Result<Arc<PgPool>, sqlx::Error> {
    let pool = PgPool::connect(database_url).await?;
    sqlx::migrate!().run(&pool).await?;
    Ok(Arc::new(pool))
}

pub async fn setup_router(settings: &settings::Settings) -> anyhow::Result<Router> {
    let db = setup_database(&settings.database_url).await?;
    let state = setup_services(db, settings);
    let router = setup_routes();

    Ok(router
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state)))
}

/// Wires the repository, directory client and event channel together and
/// spawns the notification fanout consumer.
pub fn setup_services(db: Arc<PgPool>, settings: &settings::Settings) -> AppState {
    let repository: Arc<dyn RelationshipRepository> = Arc::new(PgRelationshipRepository::new(db));
    let user_directory: Arc<dyn UserDirectory> = Arc::new(HttpUserDirectory::new(
        settings.user_directory_url.clone(),
        settings.user_directory_api_key.clone(),
    ));
    let (events, receiver) = EventPublisher::channel();

    let notification_service = Arc::new(NotificationService::new(
        repository.clone(),
        user_directory.clone(),
    ));
    tokio::spawn(notification_service.clone().run(receiver));

    AppState {
        friendship_service: Arc::new(FriendshipService::new(
            repository.clone(),
            user_directory.clone(),
            events.clone(),
        )),
        follow_service: Arc::new(FollowService::new(
            repository.clone(),
            user_directory.clone(),
            events,
        )),
        query_service: Arc::new(RelationshipQueryService::new(repository, user_directory)),
        notification_service,
    }
}

pub fn init_tracing(settings: &settings::Settings) {
    let env = settings.environment.clone().unwrap_or("DEV".to_string());
    let level = match env.as_str() {
        "PROD" => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true)
        .with_ansi(env != "PROD")
        .init();
}
