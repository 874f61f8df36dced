//! Session-token authentication for the storefront and the admin back-office.

use chrono::{DateTime, Duration, Utc};
use db::models::user::{CreateUser, Session, User};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

const SESSION_TTL_DAYS: i64 = 30;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("email or username is already registered")]
    DuplicateIdentity,
    #[error("{0}")]
    Validation(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired session")]
    InvalidSession,
}

/// Login result: the user plus their bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AuthToken {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthService;

impl AuthService {
    pub fn hash_password(password: &str, salt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn random_hex(len: usize) -> String {
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Register a new account. The first account ever created becomes the
    /// bootstrap admin.
    pub async fn register(pool: &SqlitePool, data: CreateUser) -> Result<User, AuthError> {
        if !data.email.contains('@') {
            return Err(AuthError::Validation("a valid email is required".into()));
        }
        if data.username.trim().len() < 3 {
            return Err(AuthError::Validation(
                "username must be at least 3 characters".into(),
            ));
        }
        if data.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if User::email_or_username_taken(pool, &data.email, &data.username).await? {
            return Err(AuthError::DuplicateIdentity);
        }

        let salt = Self::random_hex(16);
        let hash = Self::hash_password(&data.password, &salt);
        let is_admin = User::count(pool).await? == 0;
        let user = User::create(pool, Uuid::new_v4(), &data, &hash, &salt, is_admin).await?;
        info!(user_id = %user.id, username = %user.username, is_admin, "user registered");
        Ok(user)
    }

    /// Log in with email or username. Deactivated accounts are
    /// indistinguishable from wrong credentials.
    pub async fn login(
        pool: &SqlitePool,
        identifier: &str,
        password: &str,
    ) -> Result<AuthToken, AuthError> {
        let user = User::find_by_identifier(pool, identifier)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }
        if Self::hash_password(password, &user.password_salt) != user.password_hash {
            return Err(AuthError::InvalidCredentials);
        }

        let token = Self::random_hex(32);
        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);
        Session::create(pool, user.id, &token, expires_at).await?;
        info!(user_id = %user.id, "session created");
        Ok(AuthToken {
            user,
            token,
            expires_at,
        })
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate(pool: &SqlitePool, token: &str) -> Result<User, AuthError> {
        Session::find_user_by_token(pool, token)
            .await?
            .ok_or(AuthError::InvalidSession)
    }

    pub async fn logout(pool: &SqlitePool, token: &str) -> Result<(), AuthError> {
        Session::delete_by_token(pool, token).await?;
        Ok(())
    }
}
