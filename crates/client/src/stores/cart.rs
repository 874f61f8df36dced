//! Shopping cart. Purely local until checkout: line items live in the store,
//! and the server only sees them when the order is posted.

use db::models::{order::OrderWithItems, product::Product};
use serde::{Deserialize, Serialize};
use services::services::orders::{CheckoutItem, CheckoutRequest, ShippingAddress};
use uuid::Uuid;

use crate::api::{ApiClient, ClientError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub image_url: Option<String>,
}

/// Contact fields captured at checkout, decoupled from any account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Default)]
pub struct CartStore {
    items: Vec<CartItem>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn subtotal_cents(&self) -> i64 {
        self.items
            .iter()
            .map(|item| item.unit_price_cents * item.quantity)
            .sum()
    }

    /// Add a product to the cart, merging quantities for repeat additions.
    pub fn add_product(&mut self, product: &Product, quantity: i64) {
        if quantity <= 0 {
            return;
        }
        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            Some(existing) => existing.quantity += quantity,
            None => self.items.push(CartItem {
                product_id: product.id,
                name: product.name.clone(),
                unit_price_cents: product.price_cents,
                quantity,
                image_url: None,
            }),
        }
    }

    /// Set a line's quantity; zero (or less) removes the line.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
        } else if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            item.quantity = quantity;
        }
    }

    pub fn remove(&mut self, product_id: Uuid) {
        self.items.retain(|item| item.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Post the cart as an order. The cart is cleared only when the server
    /// accepts it; on failure the contents are untouched.
    pub async fn checkout(
        &mut self,
        api: &ApiClient,
        contact: CheckoutContact,
        address: ShippingAddress,
        notes: Option<String>,
    ) -> Result<OrderWithItems, ClientError> {
        let request = CheckoutRequest {
            customer_name: contact.name,
            customer_email: contact.email,
            customer_phone: contact.phone,
            shipping_address: address,
            items: self
                .items
                .iter()
                .map(|item| CheckoutItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
            notes,
        };
        let order: OrderWithItems = api.post("/api/orders", &request).await?;
        self.items.clear();
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(price_cents: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Test Product".to_string(),
            slug: "test-product".to_string(),
            description: None,
            price_cents,
            original_price_cents: None,
            discount_percent: None,
            category_id: Uuid::new_v4(),
            brand_id: None,
            sku: None,
            stock_quantity: 10,
            in_stock: true,
            is_active: true,
            is_featured: false,
            is_new: false,
            is_hot: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn repeat_additions_merge_quantities() {
        let mut cart = CartStore::new();
        let phone = product(799_00);
        cart.add_product(&phone, 1);
        cart.add_product(&phone, 2);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_quantity(), 3);
        assert_eq!(cart.subtotal_cents(), 2397_00);
    }

    #[test]
    fn zero_quantity_removes_the_line() {
        let mut cart = CartStore::new();
        let phone = product(799_00);
        let case = product(19_99);
        cart.add_product(&phone, 1);
        cart.add_product(&case, 4);
        cart.set_quantity(case.id, 0);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].product_id, phone.id);
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let mut cart = CartStore::new();
        cart.add_product(&product(100_00), 2);
        cart.add_product(&product(9_99), 1);
        assert_eq!(cart.subtotal_cents(), 209_99);
    }
}
