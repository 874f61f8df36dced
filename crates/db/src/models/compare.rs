use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Join row linking a user to a product on their compare list. Cardinality and
/// single-category rules live in the compare service, not here.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CompareEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl CompareEntry {
    pub async fn find_by_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, user_id, product_id, created_at
               FROM compare_items
               WHERE user_id = $1
               ORDER BY created_at ASC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM compare_items WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn exists(
        pool: &SqlitePool,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM compare_items WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn insert(
        pool: &SqlitePool,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO compare_items (id, user_id, product_id)
               VALUES ($1, $2, $3)
               RETURNING id, user_id, product_id, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(product_id)
        .fetch_one(pool)
        .await
    }

    pub async fn remove(
        pool: &SqlitePool,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM compare_items WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn clear_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM compare_items WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Drop all compare rows for a product. Runs inside the product-deletion
    /// transaction.
    pub async fn delete_for_product<'e, E>(executor: E, product_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM compare_items WHERE product_id = $1")
            .bind(product_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
