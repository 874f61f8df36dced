use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_salt: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User joined with their order count, for the admin user table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct UserWithOrderCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    #[ts(flatten)]
    pub user: User,
    pub order_count: i64,
}

impl std::ops::Deref for UserWithOrderCount {
    type Target = User;
    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Admin toggles for another user's account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct AdminUpdateUser {
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, phone, password_hash, \
     password_salt, is_admin, is_active, created_at, updated_at";

impl User {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look a user up by email or username, for login.
    pub async fn find_by_identifier(
        pool: &SqlitePool,
        identifier: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR username = $1"
        ))
        .bind(identifier)
        .fetch_optional(pool)
        .await
    }

    pub async fn email_or_username_taken(
        pool: &SqlitePool,
        email: &str,
        username: &str,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE email = $1 OR username = $2",
        )
        .bind(email)
        .bind(username)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        data: &CreateUser,
        password_hash: &str,
        password_salt: &str,
        is_admin: bool,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            r#"INSERT INTO users
                 (id, email, username, first_name, last_name, phone, password_hash, password_salt, is_admin)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.email)
        .bind(&data.username)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.phone)
        .bind(password_hash)
        .bind(password_salt)
        .bind(is_admin)
        .fetch_one(pool)
        .await
    }

    pub async fn find_all_with_order_counts(
        pool: &SqlitePool,
    ) -> Result<Vec<UserWithOrderCount>, sqlx::Error> {
        sqlx::query_as::<_, UserWithOrderCount>(
            r#"SELECT
                 u.id, u.email, u.username, u.first_name, u.last_name, u.phone,
                 u.password_hash, u.password_salt, u.is_admin, u.is_active,
                 u.created_at, u.updated_at,
                 (SELECT COUNT(*) FROM orders o WHERE o.user_id = u.id) AS order_count
               FROM users u
               ORDER BY u.created_at DESC"#,
        )
        .fetch_all(pool)
        .await
    }

    /// Apply admin account toggles.
    pub async fn set_flags(
        pool: &SqlitePool,
        id: Uuid,
        is_admin: bool,
        is_active: bool,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            r#"UPDATE users
               SET is_admin = $2, is_active = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(id)
        .bind(is_admin)
        .bind(is_active)
        .fetch_one(pool)
        .await
    }
}

impl Session {
    pub async fn create(
        pool: &SqlitePool,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO sessions (id, user_id, token, expires_at)
               VALUES ($1, $2, $3, $4)
               RETURNING id, user_id, token, expires_at, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    /// Resolve a bearer token to its user, ignoring expired sessions and
    /// deactivated accounts.
    pub async fn find_user_by_token(
        pool: &SqlitePool,
        token: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"SELECT
                 u.id, u.email, u.username, u.first_name, u.last_name, u.phone,
                 u.password_hash, u.password_salt, u.is_admin, u.is_active,
                 u.created_at, u.updated_at
               FROM sessions s
               JOIN users u ON u.id = s.user_id
               WHERE s.token = $1
                 AND datetime(s.expires_at) > datetime('now')
                 AND u.is_active = 1"#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete_by_token(pool: &SqlitePool, token: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
