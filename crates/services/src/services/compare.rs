//! Compare service. The server is the source of truth for the compare rules:
//! at most four products, all from one category.

use std::collections::HashSet;

use db::models::{
    compare::CompareEntry,
    product::{Product, ProductSpecification},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

pub const MAX_COMPARE_ITEMS: usize = 4;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("product not found")]
    ProductNotFound,
    #[error("compare list already holds {MAX_COMPARE_ITEMS} products")]
    ListFull,
    #[error("only products from the same category can be compared")]
    CategoryMismatch,
}

/// One specification row across all compared products, in product order.
/// `has_differences` is true when the values are not all identical.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ComparisonRow {
    pub name: String,
    pub values: Vec<Option<String>>,
    pub has_differences: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ComparisonGroup {
    pub group_name: String,
    pub rows: Vec<ComparisonRow>,
}

/// Side-by-side comparison served to the compare page.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ComparisonTable {
    pub products: Vec<Product>,
    pub groups: Vec<ComparisonGroup>,
}

pub struct CompareService;

impl CompareService {
    /// Add a product to the user's compare list. Re-adding an existing entry
    /// is a no-op; rule violations are reported, not silently ignored.
    pub async fn add(
        pool: &SqlitePool,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<CompareEntry>, CompareError> {
        let product = Product::find_by_id(pool, product_id)
            .await?
            .ok_or(CompareError::ProductNotFound)?;

        if !CompareEntry::exists(pool, user_id, product_id).await? {
            let entries = CompareEntry::find_by_user(pool, user_id).await?;
            if entries.len() >= MAX_COMPARE_ITEMS {
                return Err(CompareError::ListFull);
            }
            if !entries.is_empty() {
                let existing_ids: Vec<Uuid> = entries.iter().map(|e| e.product_id).collect();
                let existing = Product::find_by_ids(pool, &existing_ids).await?;
                if existing.iter().any(|p| p.category_id != product.category_id) {
                    return Err(CompareError::CategoryMismatch);
                }
            }
            CompareEntry::insert(pool, user_id, product_id).await?;
        }
        Ok(CompareEntry::find_by_user(pool, user_id).await?)
    }

    pub async fn remove(
        pool: &SqlitePool,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<CompareEntry>, CompareError> {
        CompareEntry::remove(pool, user_id, product_id).await?;
        Ok(CompareEntry::find_by_user(pool, user_id).await?)
    }

    pub async fn clear(pool: &SqlitePool, user_id: Uuid) -> Result<(), CompareError> {
        CompareEntry::clear_for_user(pool, user_id).await?;
        Ok(())
    }

    pub async fn entries(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<CompareEntry>, CompareError> {
        Ok(CompareEntry::find_by_user(pool, user_id).await?)
    }

    /// Build the side-by-side table: specifications grouped by group name,
    /// rows in first-seen order, one value column per compared product.
    pub async fn comparison_table(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<ComparisonTable, CompareError> {
        let entries = CompareEntry::find_by_user(pool, user_id).await?;
        let ids: Vec<Uuid> = entries.iter().map(|e| e.product_id).collect();
        let fetched = Product::find_by_ids(pool, &ids).await?;
        // Keep entry insertion order, not whatever order the IN query returned.
        let products: Vec<Product> = ids
            .iter()
            .filter_map(|id| fetched.iter().find(|p| p.id == *id).cloned())
            .collect();

        let specs = ProductSpecification::find_by_products(pool, &ids).await?;
        let column_of = |product_id: Uuid| products.iter().position(|p| p.id == product_id);

        let mut groups: Vec<ComparisonGroup> = Vec::new();
        for product in &products {
            for spec in specs.iter().filter(|s| s.product_id == product.id) {
                let Some(column) = column_of(spec.product_id) else {
                    continue;
                };
                let group_idx = match groups.iter().position(|g| g.group_name == spec.group_name) {
                    Some(idx) => idx,
                    None => {
                        groups.push(ComparisonGroup {
                            group_name: spec.group_name.clone(),
                            rows: Vec::new(),
                        });
                        groups.len() - 1
                    }
                };
                let rows = &mut groups[group_idx].rows;
                let row_idx = match rows.iter().position(|r| r.name == spec.name) {
                    Some(idx) => idx,
                    None => {
                        rows.push(ComparisonRow {
                            name: spec.name.clone(),
                            values: vec![None; products.len()],
                            has_differences: false,
                        });
                        rows.len() - 1
                    }
                };
                rows[row_idx].values[column] = Some(spec.value.clone());
            }
        }

        for group in &mut groups {
            for row in &mut group.rows {
                let distinct: HashSet<&Option<String>> = row.values.iter().collect();
                row.has_differences = distinct.len() > 1;
            }
        }

        Ok(ComparisonTable { products, groups })
    }
}
