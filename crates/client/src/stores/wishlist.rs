//! Wishlist store: mirrors the user's server-side wishlist rows so heart
//! badges render without a network round-trip.

use db::models::{product::Product, wishlist::WishlistEntry};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{ApiClient, ClientError};

/// Wishlist entry joined with its product, as served by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistItem {
    #[serde(flatten)]
    pub entry: WishlistEntry,
    pub product: Product,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToggleRequest {
    product_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleResult {
    pub added: bool,
    pub entries: Vec<WishlistEntry>,
}

#[derive(Debug, Default)]
pub struct WishlistStore {
    items: Vec<WishlistItem>,
}

impl WishlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Synchronous membership check against the local cache.
    pub fn contains(&self, product_id: Uuid) -> bool {
        self.items
            .iter()
            .any(|item| item.entry.product_id == product_id)
    }

    /// Refetch the wishlist from the server; called on login and after
    /// mutations made elsewhere.
    pub async fn refresh(&mut self, api: &ApiClient) -> Result<(), ClientError> {
        self.items = api.get("/api/wishlist").await?;
        Ok(())
    }

    /// Idempotent toggle: add if absent, remove otherwise. The cache is
    /// updated only when the server accepts the mutation.
    pub async fn toggle(&mut self, api: &ApiClient, product_id: Uuid) -> Result<bool, ClientError> {
        let result: ToggleResult = api
            .post("/api/wishlist/toggle", &ToggleRequest { product_id })
            .await?;
        self.refresh(api).await?;
        Ok(result.added)
    }

    pub async fn clear(&mut self, api: &ApiClient) -> Result<(), ClientError> {
        api.delete_ok("/api/wishlist").await?;
        self.items.clear();
        Ok(())
    }
}
