use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use uuid::Uuid;

use crate::{models::users::UserProfile, utils::errors::app_error::AppError};

/// Identity provider consumed by this service. Users are issued and
/// stored elsewhere; we only resolve ids to profile summaries and roles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `None` means the id is unknown to the directory.
    async fn lookup(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError>;
}

pub struct HttpUserDirectory {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpUserDirectory {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn lookup(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        let mut request = self
            .client
            .get(format!("{}/users/{}", self.base_url, user_id));
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let profile = response.error_for_status()?.json::<UserProfile>().await?;
        Ok(Some(profile))
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::{
        models::users::{UserProfile, UserRole},
        utils::errors::app_error::AppError,
    };

    use super::UserDirectory;

    /// Directory fake backed by a fixed profile set.
    pub struct StaticUserDirectory {
        profiles: HashMap<Uuid, UserProfile>,
    }

    impl StaticUserDirectory {
        pub fn new(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
            Self {
                profiles: profiles.into_iter().map(|p| (p.id, p)).collect(),
            }
        }
    }

    pub fn profile(id: Uuid, username: &str, role: UserRole) -> UserProfile {
        UserProfile {
            id,
            username: username.to_string(),
            full_name: None,
            avatar_url: None,
            role,
        }
    }

    #[async_trait]
    impl UserDirectory for StaticUserDirectory {
        async fn lookup(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
            Ok(self.profiles.get(&user_id).cloned())
        }
    }
}
