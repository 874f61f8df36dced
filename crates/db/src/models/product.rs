use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub original_price_cents: Option<i64>,
    pub discount_percent: Option<i64>, // Derived from price pair, NULL when either is absent
    pub category_id: Uuid,
    pub brand_id: Option<Uuid>,
    pub sku: Option<String>,
    pub stock_quantity: i64,
    pub in_stock: bool, // Derived: stock_quantity > 0
    pub is_active: bool,
    pub is_featured: bool,
    pub is_new: bool,
    pub is_hot: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub sort_order: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ProductSpecification {
    pub id: Uuid,
    pub product_id: Uuid,
    pub group_name: String,
    pub name: String,
    pub value: String,
    pub sort_order: i64,
}

/// Product with its ordered images and specifications, as served on detail pages.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ProductWithDetails {
    #[serde(flatten)]
    #[ts(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
    pub specifications: Vec<ProductSpecification>,
}

impl std::ops::Deref for ProductWithDetails {
    type Target = Product;
    fn deref(&self) -> &Self::Target {
        &self.product
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ProductImageInput {
    pub url: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ProductSpecificationInput {
    pub group_name: String,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub original_price_cents: Option<i64>,
    pub category_id: Uuid,
    pub brand_id: Option<Uuid>,
    pub sku: Option<String>,
    pub stock_quantity: Option<i64>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_new: Option<bool>,
    pub is_hot: Option<bool>,
    pub images: Option<Vec<ProductImageInput>>,
    pub specifications: Option<Vec<ProductSpecificationInput>>,
}

/// Partial update: only supplied fields change. `original_price_cents` is
/// double-optional so an explicit `null` ends a sale while an absent field
/// leaves it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price_cents: Option<Option<i64>>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub sku: Option<String>,
    pub stock_quantity: Option<i64>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_new: Option<bool>,
    pub is_hot: Option<bool>,
    pub images: Option<Vec<ProductImageInput>>,
    pub specifications: Option<Vec<ProductSpecificationInput>>,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

/// Catalog listing filters. Category slugs are resolved to ids by the caller.
#[derive(Debug, Clone)]
pub struct ProductFilters {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub is_new: Option<bool>,
    pub hot: Option<bool>,
    pub in_stock: Option<bool>,
    pub active_only: bool,
    pub sort: ProductSort,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ProductFilters {
    fn default() -> Self {
        Self {
            category_id: None,
            search: None,
            featured: None,
            is_new: None,
            hot: None,
            in_stock: None,
            active_only: true,
            sort: ProductSort::default(),
            limit: 50,
            offset: 0,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price_cents, original_price_cents, \
     discount_percent, category_id, brand_id, sku, stock_quantity, in_stock, \
     is_active, is_featured, is_new, is_hot, created_at, updated_at";

impl Product {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_ids(pool: &SqlitePool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        qb.build_query_as::<Self>().fetch_all(pool).await
    }

    pub async fn find_by_category(
        pool: &SqlitePool,
        category_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = $1 ORDER BY name ASC"
        ))
        .bind(category_id)
        .fetch_all(pool)
        .await
    }

    pub async fn search(
        pool: &SqlitePool,
        filters: &ProductFilters,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1 = 1"));
        if filters.active_only {
            qb.push(" AND is_active = 1");
        }
        if let Some(category_id) = filters.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(search) = filters.search.as_ref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            qb.push(" AND (name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR description LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(featured) = filters.featured {
            qb.push(" AND is_featured = ").push_bind(featured);
        }
        if let Some(is_new) = filters.is_new {
            qb.push(" AND is_new = ").push_bind(is_new);
        }
        if let Some(hot) = filters.hot {
            qb.push(" AND is_hot = ").push_bind(hot);
        }
        if let Some(in_stock) = filters.in_stock {
            qb.push(" AND in_stock = ").push_bind(in_stock);
        }
        qb.push(match filters.sort {
            ProductSort::Newest => " ORDER BY created_at DESC",
            ProductSort::PriceAsc => " ORDER BY price_cents ASC",
            ProductSort::PriceDesc => " ORDER BY price_cents DESC",
            ProductSort::NameAsc => " ORDER BY name ASC",
        });
        qb.push(" LIMIT ")
            .push_bind(filters.limit)
            .push(" OFFSET ")
            .push_bind(filters.offset);
        qb.build_query_as::<Self>().fetch_all(pool).await
    }

    pub async fn find_details(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<ProductWithDetails>, sqlx::Error> {
        let Some(product) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let images = ProductImage::find_by_product(pool, id).await?;
        let specifications = ProductSpecification::find_by_product(pool, id).await?;
        Ok(Some(ProductWithDetails {
            product,
            images,
            specifications,
        }))
    }

    pub async fn create(
        conn: &mut SqliteConnection,
        id: Uuid,
        data: &CreateProduct,
        slug: &str,
        discount_percent: Option<i64>,
        in_stock: bool,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            r#"INSERT INTO products
                 (id, name, slug, description, price_cents, original_price_cents,
                  discount_percent, category_id, brand_id, sku, stock_quantity, in_stock,
                  is_active, is_featured, is_new, is_hot)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
               RETURNING {PRODUCT_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.name)
        .bind(slug)
        .bind(&data.description)
        .bind(data.price_cents)
        .bind(data.original_price_cents)
        .bind(discount_percent)
        .bind(data.category_id)
        .bind(data.brand_id)
        .bind(&data.sku)
        .bind(data.stock_quantity.unwrap_or(0))
        .bind(in_stock)
        .bind(data.is_active.unwrap_or(true))
        .bind(data.is_featured.unwrap_or(false))
        .bind(data.is_new.unwrap_or(false))
        .bind(data.is_hot.unwrap_or(false))
        .fetch_one(conn)
        .await
    }

    /// Persist a merged product row. Callers fetch, apply partial changes and
    /// rederived fields, then write the whole row back.
    pub async fn update(pool: &SqlitePool, product: &Product) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            r#"UPDATE products
               SET name = $2, slug = $3, description = $4, price_cents = $5,
                   original_price_cents = $6, discount_percent = $7, category_id = $8,
                   brand_id = $9, sku = $10, stock_quantity = $11, in_stock = $12,
                   is_active = $13, is_featured = $14, is_new = $15, is_hot = $16,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {PRODUCT_COLUMNS}"#
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.original_price_cents)
        .bind(product.discount_percent)
        .bind(product.category_id)
        .bind(product.brand_id)
        .bind(&product.sku)
        .bind(product.stock_quantity)
        .bind(product.in_stock)
        .bind(product.is_active)
        .bind(product.is_featured)
        .bind(product.is_new)
        .bind(product.is_hot)
        .fetch_one(pool)
        .await
    }

    pub async fn set_stock<'e, E>(
        executor: E,
        id: Uuid,
        stock_quantity: i64,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"UPDATE products
               SET stock_quantity = $2, in_stock = ($2 > 0),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(stock_quantity)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Move every product in `from` to the `to` category. Runs inside the
    /// category-deletion transaction.
    pub async fn reassign_category<'e, E>(
        executor: E,
        from: Uuid,
        to: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"UPDATE products
               SET category_id = $2, updated_at = datetime('now', 'subsec')
               WHERE category_id = $1"#,
        )
        .bind(from)
        .bind(to)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_by_category(
        pool: &SqlitePool,
        category_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(pool)
            .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Whether `slug` is already used by a product other than `exclude`.
    pub async fn slug_taken(
        pool: &SqlitePool,
        slug: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE slug = $1 AND ($2 IS NULL OR id != $2)",
        )
        .bind(slug)
        .bind(exclude)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }
}

impl ProductImage {
    pub async fn find_by_product(
        pool: &SqlitePool,
        product_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, product_id, url, alt_text, sort_order
               FROM product_images
               WHERE product_id = $1
               ORDER BY sort_order ASC"#,
        )
        .bind(product_id)
        .fetch_all(pool)
        .await
    }

    /// Replace a product's image list, preserving input order.
    pub async fn replace_for_product(
        conn: &mut SqliteConnection,
        product_id: Uuid,
        images: &[ProductImageInput],
    ) -> Result<(), sqlx::Error> {
        Self::delete_for_product(&mut *conn, product_id).await?;
        for (position, image) in images.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO product_images (id, product_id, url, alt_text, sort_order)
                   VALUES ($1, $2, $3, $4, $5)"#,
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(&image.url)
            .bind(&image.alt_text)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn delete_for_product<'e, E>(executor: E, product_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM product_images WHERE product_id = $1")
            .bind(product_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

impl ProductSpecification {
    pub async fn find_by_product(
        pool: &SqlitePool,
        product_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, product_id, group_name, name, value, sort_order
               FROM product_specifications
               WHERE product_id = $1
               ORDER BY sort_order ASC"#,
        )
        .bind(product_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_products(
        pool: &SqlitePool,
        product_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, product_id, group_name, name, value, sort_order \
             FROM product_specifications WHERE product_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in product_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY sort_order ASC");
        qb.build_query_as::<Self>().fetch_all(pool).await
    }

    /// Replace a product's specification list, preserving input order.
    pub async fn replace_for_product(
        conn: &mut SqliteConnection,
        product_id: Uuid,
        specifications: &[ProductSpecificationInput],
    ) -> Result<(), sqlx::Error> {
        Self::delete_for_product(&mut *conn, product_id).await?;
        for (position, spec) in specifications.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO product_specifications (id, product_id, group_name, name, value, sort_order)
                   VALUES ($1, $2, $3, $4, $5, $6)"#,
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(&spec.group_name)
            .bind(&spec.name)
            .bind(&spec.value)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn delete_for_product<'e, E>(executor: E, product_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM product_specifications WHERE product_id = $1")
            .bind(product_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
