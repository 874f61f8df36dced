//! Compare store. The cached product list backs synchronous membership
//! checks and fast local pre-checks of the compare rules; the server remains
//! the source of truth and re-validates every insertion.

use db::models::{compare::CompareEntry, product::Product};
use serde::{Deserialize, Serialize};
use services::services::compare::{ComparisonTable, MAX_COMPARE_ITEMS};
use thiserror::Error;
use uuid::Uuid;

use crate::api::{ApiClient, ClientError};

#[derive(Debug, Error)]
pub enum CompareStoreError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("compare list already holds {MAX_COMPARE_ITEMS} products")]
    ListFull,
    #[error("only products from the same category can be compared")]
    CategoryMismatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AddRequest {
    product_id: Uuid,
}

#[derive(Debug, Default)]
pub struct CompareStore {
    products: Vec<Product>,
}

impl CompareStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Synchronous membership check against the local cache.
    pub fn contains(&self, product_id: Uuid) -> bool {
        self.products.iter().any(|p| p.id == product_id)
    }

    /// Local pre-check of the insertion rules, for immediate UI feedback
    /// without a round-trip.
    pub fn can_add(&self, product: &Product) -> Result<(), CompareStoreError> {
        if self.contains(product.id) {
            return Ok(());
        }
        if self.products.len() >= MAX_COMPARE_ITEMS {
            return Err(CompareStoreError::ListFull);
        }
        if self
            .products
            .iter()
            .any(|p| p.category_id != product.category_id)
        {
            return Err(CompareStoreError::CategoryMismatch);
        }
        Ok(())
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> Result<(), ClientError> {
        let table: ComparisonTable = api.get("/api/compare").await?;
        self.products = table.products;
        Ok(())
    }

    /// Add a product. Rule violations fail fast locally; the server check
    /// still runs and the cache changes only on success.
    pub async fn add(
        &mut self,
        api: &ApiClient,
        product: &Product,
    ) -> Result<(), CompareStoreError> {
        self.can_add(product)?;
        if self.contains(product.id) {
            return Ok(());
        }
        let _entries: Vec<CompareEntry> = api
            .post(
                "/api/compare",
                &AddRequest {
                    product_id: product.id,
                },
            )
            .await?;
        self.products.push(product.clone());
        Ok(())
    }

    pub async fn remove(&mut self, api: &ApiClient, product_id: Uuid) -> Result<(), ClientError> {
        let _entries: Vec<CompareEntry> = api.delete(&format!("/api/compare/{product_id}")).await?;
        self.products.retain(|p| p.id != product_id);
        Ok(())
    }

    pub async fn clear(&mut self, api: &ApiClient) -> Result<(), ClientError> {
        api.delete_ok("/api/compare").await?;
        self.products.clear();
        Ok(())
    }

    /// Fetch the full side-by-side table for the compare page.
    pub async fn comparison(&self, api: &ApiClient) -> Result<ComparisonTable, ClientError> {
        api.get("/api/compare").await
    }
}
