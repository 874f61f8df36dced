//! Catalog service: slug derivation, product mutations with derived fields,
//! cascading deletes, and category deletion with product reassignment.

use chrono::Utc;
use db::models::{
    brand::Brand,
    category::{Category, CategoryWithCount, CreateCategory, UpdateCategory},
    compare::CompareEntry,
    product::{
        CreateProduct, Product, ProductImage, ProductSpecification, ProductWithDetails,
        UpdateProduct,
    },
    wishlist::WishlistEntry,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error(
        "category still has {product_count} products; supply a target category to move them to"
    )]
    CategoryNotEmpty { product_count: i64 },
}

/// Outcome of a category deletion, reported back to the admin UI.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CategoryDeletion {
    pub deleted_id: Uuid,
    pub reassigned_products: u64,
    pub moved_to: Option<Uuid>,
}

/// Derive a URL-safe slug from a human-readable name: lowercase alphanumerics,
/// runs of anything else collapsed to a single dash.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

/// Discount percentage derived from the price pair: NULL unless an original
/// price is present.
pub fn discount_percent(price_cents: i64, original_price_cents: Option<i64>) -> Option<i64> {
    match original_price_cents {
        Some(original) if original > 0 => {
            Some((((original - price_cents) as f64 / original as f64) * 100.0).round() as i64)
        }
        _ => None,
    }
}

pub struct CatalogService;

impl CatalogService {
    /// Slug for a product name. A collision with a *different* product is
    /// disambiguated with a timestamp suffix rather than rejected.
    pub async fn unique_product_slug(
        pool: &SqlitePool,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<String, CatalogError> {
        let base = slugify(name);
        if !Product::slug_taken(pool, &base, exclude).await? {
            return Ok(base);
        }
        Ok(format!("{base}-{}", Utc::now().timestamp_millis()))
    }

    pub async fn unique_category_slug(
        pool: &SqlitePool,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<String, CatalogError> {
        let base = slugify(name);
        if !Category::slug_taken(pool, &base, exclude).await? {
            return Ok(base);
        }
        Ok(format!("{base}-{}", Utc::now().timestamp_millis()))
    }

    pub async fn create_product(
        pool: &SqlitePool,
        data: CreateProduct,
    ) -> Result<ProductWithDetails, CatalogError> {
        if data.name.trim().is_empty() {
            return Err(CatalogError::Validation("product name is required".into()));
        }
        if data.price_cents <= 0 {
            return Err(CatalogError::Validation("price must be positive".into()));
        }
        if data.original_price_cents.is_some_and(|p| p <= 0) {
            return Err(CatalogError::Validation(
                "original price must be positive".into(),
            ));
        }
        if data.stock_quantity.is_some_and(|s| s < 0) {
            return Err(CatalogError::Validation(
                "stock quantity cannot be negative".into(),
            ));
        }
        Category::find_by_id(pool, data.category_id)
            .await?
            .ok_or_else(|| CatalogError::Validation("category does not exist".into()))?;
        if let Some(brand_id) = data.brand_id {
            Brand::find_by_id(pool, brand_id)
                .await?
                .ok_or_else(|| CatalogError::Validation("brand does not exist".into()))?;
        }

        let id = Uuid::new_v4();
        let slug = Self::unique_product_slug(pool, data.name.trim(), None).await?;
        let discount = discount_percent(data.price_cents, data.original_price_cents);
        let stock = data.stock_quantity.unwrap_or(0);

        let mut tx = pool.begin().await?;
        let product = Product::create(&mut tx, id, &data, &slug, discount, stock > 0).await?;
        if let Some(images) = &data.images {
            ProductImage::replace_for_product(&mut tx, id, images).await?;
        }
        if let Some(specifications) = &data.specifications {
            ProductSpecification::replace_for_product(&mut tx, id, specifications).await?;
        }
        tx.commit().await?;

        info!(product_id = %product.id, slug = %product.slug, "product created");
        Product::find_details(pool, product.id)
            .await?
            .ok_or(CatalogError::NotFound("product"))
    }

    /// Partial update: only supplied fields change. Renames regenerate the
    /// slug; price and stock changes rederive discount and in-stock state.
    pub async fn update_product(
        pool: &SqlitePool,
        id: Uuid,
        data: UpdateProduct,
    ) -> Result<ProductWithDetails, CatalogError> {
        let mut product = Product::find_by_id(pool, id)
            .await?
            .ok_or(CatalogError::NotFound("product"))?;

        if let Some(name) = &data.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(CatalogError::Validation("product name is required".into()));
            }
            if name != product.name {
                product.slug = Self::unique_product_slug(pool, name, Some(id)).await?;
                product.name = name.to_string();
            }
        }
        if let Some(description) = data.description {
            product.description = Some(description);
        }
        if let Some(price) = data.price_cents {
            if price <= 0 {
                return Err(CatalogError::Validation("price must be positive".into()));
            }
            product.price_cents = price;
        }
        if let Some(original) = data.original_price_cents {
            if original.is_some_and(|p| p <= 0) {
                return Err(CatalogError::Validation(
                    "original price must be positive".into(),
                ));
            }
            product.original_price_cents = original;
        }
        if let Some(category_id) = data.category_id {
            Category::find_by_id(pool, category_id)
                .await?
                .ok_or_else(|| CatalogError::Validation("category does not exist".into()))?;
            product.category_id = category_id;
        }
        if let Some(brand_id) = data.brand_id {
            Brand::find_by_id(pool, brand_id)
                .await?
                .ok_or_else(|| CatalogError::Validation("brand does not exist".into()))?;
            product.brand_id = Some(brand_id);
        }
        if let Some(sku) = data.sku {
            product.sku = Some(sku);
        }
        if let Some(stock) = data.stock_quantity {
            if stock < 0 {
                return Err(CatalogError::Validation(
                    "stock quantity cannot be negative".into(),
                ));
            }
            product.stock_quantity = stock;
            product.in_stock = stock > 0;
        }
        if let Some(is_active) = data.is_active {
            product.is_active = is_active;
        }
        if let Some(is_featured) = data.is_featured {
            product.is_featured = is_featured;
        }
        if let Some(is_new) = data.is_new {
            product.is_new = is_new;
        }
        if let Some(is_hot) = data.is_hot {
            product.is_hot = is_hot;
        }
        product.discount_percent =
            discount_percent(product.price_cents, product.original_price_cents);

        let updated = Product::update(pool, &product).await?;
        if data.images.is_some() || data.specifications.is_some() {
            let mut tx = pool.begin().await?;
            if let Some(images) = &data.images {
                ProductImage::replace_for_product(&mut tx, id, images).await?;
            }
            if let Some(specifications) = &data.specifications {
                ProductSpecification::replace_for_product(&mut tx, id, specifications).await?;
            }
            tx.commit().await?;
        }

        info!(product_id = %updated.id, slug = %updated.slug, "product updated");
        Product::find_details(pool, updated.id)
            .await?
            .ok_or(CatalogError::NotFound("product"))
    }

    /// Delete a product and its child rows in one transaction, so no orphaned
    /// images or specifications remain.
    pub async fn delete_product(pool: &SqlitePool, id: Uuid) -> Result<(), CatalogError> {
        Product::find_by_id(pool, id)
            .await?
            .ok_or(CatalogError::NotFound("product"))?;

        let mut tx = pool.begin().await?;
        ProductSpecification::delete_for_product(&mut *tx, id).await?;
        ProductImage::delete_for_product(&mut *tx, id).await?;
        WishlistEntry::delete_for_product(&mut *tx, id).await?;
        CompareEntry::delete_for_product(&mut *tx, id).await?;
        Product::delete(&mut *tx, id).await?;
        tx.commit().await?;

        info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn create_category(
        pool: &SqlitePool,
        data: CreateCategory,
    ) -> Result<Category, CatalogError> {
        if data.name.trim().is_empty() {
            return Err(CatalogError::Validation("category name is required".into()));
        }
        if let Some(parent_id) = data.parent_id {
            Category::find_by_id(pool, parent_id)
                .await?
                .ok_or_else(|| CatalogError::Validation("parent category does not exist".into()))?;
        }
        let slug = Self::unique_category_slug(pool, data.name.trim(), None).await?;
        let category = Category::create(pool, Uuid::new_v4(), &data, &slug).await?;
        info!(category_id = %category.id, slug = %category.slug, "category created");
        Ok(category)
    }

    pub async fn update_category(
        pool: &SqlitePool,
        id: Uuid,
        data: UpdateCategory,
    ) -> Result<Category, CatalogError> {
        let mut category = Category::find_by_id(pool, id)
            .await?
            .ok_or(CatalogError::NotFound("category"))?;

        if let Some(name) = &data.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(CatalogError::Validation("category name is required".into()));
            }
            if name != category.name {
                category.slug = Self::unique_category_slug(pool, name, Some(id)).await?;
                category.name = name.to_string();
            }
        }
        if let Some(description) = data.description {
            category.description = Some(description);
        }
        if let Some(parent_id) = data.parent_id {
            if parent_id == id {
                return Err(CatalogError::Validation(
                    "category cannot be its own parent".into(),
                ));
            }
            Category::find_by_id(pool, parent_id)
                .await?
                .ok_or_else(|| CatalogError::Validation("parent category does not exist".into()))?;
            category.parent_id = Some(parent_id);
        }
        if let Some(sort_order) = data.sort_order {
            category.sort_order = sort_order;
        }
        if let Some(is_active) = data.is_active {
            category.is_active = is_active;
        }
        if let Some(image_url) = data.image_url {
            category.image_url = Some(image_url);
        }

        Ok(Category::update(pool, &category).await?)
    }

    /// Delete a category. An empty category is deleted directly; a category
    /// that still has products requires `move_to`, and the reassignment and
    /// deletion happen in one transaction so no product is ever left pointing
    /// at a deleted category.
    pub async fn delete_category(
        pool: &SqlitePool,
        id: Uuid,
        move_to: Option<Uuid>,
    ) -> Result<CategoryDeletion, CatalogError> {
        let category = Category::find_by_id(pool, id)
            .await?
            .ok_or(CatalogError::NotFound("category"))?;
        let product_count = Product::count_by_category(pool, id).await?;

        if product_count == 0 {
            let mut tx = pool.begin().await?;
            Category::detach_children(&mut *tx, id).await?;
            Category::delete(&mut *tx, id).await?;
            tx.commit().await?;
            info!(category = %category.slug, "empty category deleted");
            return Ok(CategoryDeletion {
                deleted_id: id,
                reassigned_products: 0,
                moved_to: None,
            });
        }

        let target_id = move_to.ok_or(CatalogError::CategoryNotEmpty { product_count })?;
        if target_id == id {
            return Err(CatalogError::Validation(
                "target category must differ from the category being deleted".into(),
            ));
        }
        Category::find_by_id(pool, target_id)
            .await?
            .ok_or_else(|| CatalogError::Validation("target category does not exist".into()))?;

        let mut tx = pool.begin().await?;
        let reassigned = Product::reassign_category(&mut *tx, id, target_id).await?;
        Category::detach_children(&mut *tx, id).await?;
        Category::delete(&mut *tx, id).await?;
        tx.commit().await?;

        info!(
            category = %category.slug,
            reassigned,
            target = %target_id,
            "category deleted with product reassignment"
        );
        Ok(CategoryDeletion {
            deleted_id: id,
            reassigned_products: reassigned,
            moved_to: Some(target_id),
        })
    }

    pub async fn list_categories(
        pool: &SqlitePool,
    ) -> Result<Vec<CategoryWithCount>, CatalogError> {
        Ok(Category::find_all(pool).await?)
    }

    /// Admin diagnostic: the products still attached to a category.
    pub async fn category_cleanup_report(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Vec<Product>, CatalogError> {
        Category::find_by_id(pool, id)
            .await?
            .ok_or(CatalogError::NotFound("category"))?;
        Ok(Product::find_by_category(pool, id).await?)
    }

    /// Admin diagnostic: delete every product in a category, each with its
    /// full child-row cascade, in one transaction.
    pub async fn purge_category_products(pool: &SqlitePool, id: Uuid) -> Result<u64, CatalogError> {
        Category::find_by_id(pool, id)
            .await?
            .ok_or(CatalogError::NotFound("category"))?;
        let products = Product::find_by_category(pool, id).await?;

        let mut tx = pool.begin().await?;
        for product in &products {
            ProductSpecification::delete_for_product(&mut *tx, product.id).await?;
            ProductImage::delete_for_product(&mut *tx, product.id).await?;
            WishlistEntry::delete_for_product(&mut *tx, product.id).await?;
            CompareEntry::delete_for_product(&mut *tx, product.id).await?;
            Product::delete(&mut *tx, product.id).await?;
        }
        tx.commit().await?;

        info!(category_id = %id, purged = products.len(), "category products purged");
        Ok(products.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_and_lowercases() {
        assert_eq!(slugify("iPhone 15 Pro Max"), "iphone-15-pro-max");
        assert_eq!(slugify("  Ultra   HD!! TV  "), "ultra-hd-tv");
        assert_eq!(slugify("Café & Co."), "caf-co");
        assert_eq!(slugify("---"), "item");
    }

    #[test]
    fn discount_requires_both_prices() {
        assert_eq!(discount_percent(80_00, Some(100_00)), Some(20));
        assert_eq!(discount_percent(66_60, Some(99_90)), Some(33));
        assert_eq!(discount_percent(80_00, None), None);
        assert_eq!(discount_percent(80_00, Some(0)), None);
    }

    #[test]
    fn discount_rounds_to_nearest_percent() {
        // 14.5% rounds up, 14.4% rounds down
        assert_eq!(discount_percent(85_50, Some(100_00)), Some(15));
        assert_eq!(discount_percent(85_60, Some(100_00)), Some(14));
    }
}
