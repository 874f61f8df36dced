//! Session store: holds the logged-in user and wires the bearer token into
//! the API client.

use db::models::user::{CreateUser, User};
use serde::{Deserialize, Serialize};
use services::services::auth::AuthToken;

use crate::api::{ApiClient, ClientError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoginRequest {
    identifier: String,
    password: String,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    current_user: Option<User>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(|u| u.is_admin)
    }

    /// Create an account. Registration does not log the user in; call
    /// [`SessionStore::login`] afterwards.
    pub async fn register(&self, api: &ApiClient, data: CreateUser) -> Result<User, ClientError> {
        api.post("/api/auth/register", &data).await
    }

    pub async fn login(
        &mut self,
        api: &mut ApiClient,
        identifier: &str,
        password: &str,
    ) -> Result<User, ClientError> {
        let auth: AuthToken = api
            .post(
                "/api/auth/login",
                &LoginRequest {
                    identifier: identifier.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        api.set_token(Some(auth.token));
        self.current_user = Some(auth.user.clone());
        Ok(auth.user)
    }

    /// Re-fetch the session user, e.g. after admin flags changed.
    pub async fn refresh(&mut self, api: &ApiClient) -> Result<(), ClientError> {
        self.current_user = Some(api.get("/api/auth/me").await?);
        Ok(())
    }

    pub async fn logout(&mut self, api: &mut ApiClient) -> Result<(), ClientError> {
        api.post_ok("/api/auth/logout", &()).await?;
        api.set_token(None);
        self.current_user = None;
        Ok(())
    }
}
