//! Account routes: registration, login, session introspection, logout.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, header},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::user::{CreateUser, User};
use serde::{Deserialize, Serialize};
use services::services::auth::{AuthService, AuthToken};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, extractors::CurrentUser};

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateUser>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = AuthService::register(&state.db().pool, payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        user,
        "Account created",
    )))
}

pub async fn login(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<AuthToken>>, ApiError> {
    let token = AuthService::login(&state.db().pool, &payload.identifier, &payload.password).await?;
    Ok(ResponseJson(ApiResponse::success(token)))
}

pub async fn me(
    CurrentUser(user): CurrentUser,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        AuthService::logout(&state.db().pool, token).await?;
    }
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Logged out",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .route("/me", get(me))
            .route("/logout", post(logout)),
    )
}
