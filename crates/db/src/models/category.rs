use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>, // Self-reference forming the category tree
    pub sort_order: i64,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category joined with its denormalized product count.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CategoryWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    #[ts(flatten)]
    pub category: Category,
    pub product_count: i64,
}

impl std::ops::Deref for CategoryWithCount {
    type Target = Category;
    fn deref(&self) -> &Self::Target {
        &self.category
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: Option<i64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
    pub image_url: Option<String>,
}

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, parent_id, sort_order, is_active, image_url, created_at, updated_at";

impl Category {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// All categories with their product counts, in storefront display order.
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<CategoryWithCount>, sqlx::Error> {
        sqlx::query_as::<_, CategoryWithCount>(
            r#"SELECT
                 c.id, c.name, c.slug, c.description, c.parent_id, c.sort_order,
                 c.is_active, c.image_url, c.created_at, c.updated_at,
                 (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id) AS product_count
               FROM categories c
               ORDER BY c.sort_order ASC, c.name ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        data: &CreateCategory,
        slug: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            r#"INSERT INTO categories (id, name, slug, description, parent_id, sort_order, image_url)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {CATEGORY_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.name)
        .bind(slug)
        .bind(&data.description)
        .bind(data.parent_id)
        .bind(data.sort_order.unwrap_or(0))
        .bind(&data.image_url)
        .fetch_one(pool)
        .await
    }

    /// Persist a merged category row. Callers fetch, apply partial changes, then
    /// write the whole row back.
    pub async fn update(pool: &SqlitePool, category: &Category) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            r#"UPDATE categories
               SET name = $2, slug = $3, description = $4, parent_id = $5,
                   sort_order = $6, is_active = $7, image_url = $8,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {CATEGORY_COLUMNS}"#
        ))
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.parent_id)
        .bind(category.sort_order)
        .bind(category.is_active)
        .bind(&category.image_url)
        .fetch_one(pool)
        .await
    }

    /// Detach child categories before their parent is deleted.
    pub async fn detach_children<'e, E>(executor: E, parent_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE categories SET parent_id = NULL WHERE parent_id = $1")
            .bind(parent_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Whether `slug` is already used by a category other than `exclude`.
    pub async fn slug_taken(
        pool: &SqlitePool,
        slug: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE slug = $1 AND ($2 IS NULL OR id != $2)",
        )
        .bind(slug)
        .bind(exclude)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }
}
