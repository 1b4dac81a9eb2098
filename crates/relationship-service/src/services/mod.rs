pub mod follow_service;
pub mod friendship_service;
pub mod notification_service;
pub mod relationship_query_service;
