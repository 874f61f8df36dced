//! Session-token extractors gating storefront and admin routes.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use db::models::user::User;
use services::services::auth::AuthService;

use crate::{AppState, error::ApiError};

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Requires a valid session.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::AccessDenied)?;
        let user = AuthService::authenticate(&state.db().pool, token).await?;
        Ok(CurrentUser(user))
    }
}

/// Resolves the session user when a valid token is present; anonymous
/// callers (and stale tokens) pass through as `None`.
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = match bearer_token(parts) {
            Some(token) => AuthService::authenticate(&state.db().pool, token).await.ok(),
            None => None,
        };
        Ok(MaybeUser(user))
    }
}

/// Requires a valid session for an admin account.
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(ApiError::AccessDenied);
        }
        Ok(AdminUser(user))
    }
}
