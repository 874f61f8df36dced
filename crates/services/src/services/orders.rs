//! Orders service: checkout assembly from cart contents and admin-driven
//! fulfillment updates.

use chrono::Utc;
use db::models::{
    order::{Order, OrderItem, OrderStatus, OrderWithItems, PaymentStatus, UpdateOrder},
    product::Product,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

/// Flat shipping below the free-shipping threshold.
pub const FLAT_SHIPPING_CENTS: i64 = 9_99;
pub const FREE_SHIPPING_THRESHOLD_CENTS: i64 = 100_00;

// 0/O and 1/I excluded so order numbers survive being read over the phone.
const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("order not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("insufficient stock for {name}: {available} available")]
    InsufficientStock { name: String, available: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
}

/// Checkout payload posted by the storefront cart. Contact fields are captured
/// at order time, decoupled from any user account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: ShippingAddress,
    pub items: Vec<CheckoutItem>,
    pub notes: Option<String>,
}

pub struct OrderService;

impl OrderService {
    pub fn order_number() -> String {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..8)
            .map(|_| ORDER_NUMBER_ALPHABET[rng.gen_range(0..ORDER_NUMBER_ALPHABET.len())] as char)
            .collect();
        format!("TM-{suffix}")
    }

    pub fn shipping_cents(subtotal_cents: i64) -> i64 {
        if subtotal_cents >= FREE_SHIPPING_THRESHOLD_CENTS {
            0
        } else {
            FLAT_SHIPPING_CENTS
        }
    }

    /// Create an order from cart contents. Prices and names are snapshotted,
    /// stock is decremented, and everything commits in one transaction.
    pub async fn checkout(
        pool: &SqlitePool,
        user_id: Option<Uuid>,
        request: CheckoutRequest,
    ) -> Result<OrderWithItems, OrderError> {
        if request.items.is_empty() {
            return Err(OrderError::Validation("cart is empty".into()));
        }
        if request.customer_name.trim().is_empty() {
            return Err(OrderError::Validation("customer name is required".into()));
        }
        if !request.customer_email.contains('@') {
            return Err(OrderError::Validation(
                "a valid customer email is required".into(),
            ));
        }
        let address = &request.shipping_address;
        if [&address.street, &address.city, &address.zip_code, &address.country]
            .iter()
            .any(|f| f.trim().is_empty())
        {
            return Err(OrderError::Validation(
                "shipping address is incomplete".into(),
            ));
        }

        // Merge duplicate lines so stock is checked against the combined quantity.
        let mut merged: Vec<CheckoutItem> = Vec::new();
        for item in &request.items {
            if item.quantity <= 0 {
                return Err(OrderError::Validation(
                    "item quantity must be positive".into(),
                ));
            }
            match merged.iter_mut().find(|m| m.product_id == item.product_id) {
                Some(existing) => existing.quantity += item.quantity,
                None => merged.push(item.clone()),
            }
        }

        let mut lines = Vec::with_capacity(merged.len());
        for item in &merged {
            let product = Product::find_by_id(pool, item.product_id)
                .await?
                .ok_or_else(|| {
                    OrderError::Validation(format!("product {} does not exist", item.product_id))
                })?;
            if !product.is_active {
                return Err(OrderError::Validation(format!(
                    "{} is no longer available",
                    product.name
                )));
            }
            if product.stock_quantity < item.quantity {
                return Err(OrderError::InsufficientStock {
                    name: product.name,
                    available: product.stock_quantity,
                });
            }
            lines.push((product, item.quantity));
        }

        let subtotal_cents: i64 = lines
            .iter()
            .map(|(product, quantity)| product.price_cents * quantity)
            .sum();
        let shipping_cents = Self::shipping_cents(subtotal_cents);
        let tax_cents = 0;
        let discount_cents = 0;
        let total_cents = subtotal_cents + shipping_cents + tax_cents - discount_cents;

        let now = Utc::now();
        let header = Order {
            id: Uuid::new_v4(),
            order_number: Self::order_number(),
            user_id,
            customer_name: request.customer_name.trim().to_string(),
            customer_email: request.customer_email.trim().to_string(),
            customer_phone: request.customer_phone.clone(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            subtotal_cents,
            shipping_cents,
            tax_cents,
            discount_cents,
            total_cents,
            tracking_number: None,
            notes: request.notes.clone(),
            shipping_street: address.street.trim().to_string(),
            shipping_city: address.city.trim().to_string(),
            shipping_zip: address.zip_code.trim().to_string(),
            shipping_country: address.country.trim().to_string(),
            shipped_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = pool.begin().await?;
        let order = Order::insert(&mut tx, &header).await?;
        let mut items = Vec::with_capacity(lines.len());
        for (product, quantity) in &lines {
            let item = OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: Some(product.id),
                product_name: product.name.clone(),
                unit_price_cents: product.price_cents,
                quantity: *quantity,
                total_price_cents: product.price_cents * quantity,
            };
            OrderItem::insert(&mut tx, &item).await?;
            Product::set_stock(&mut *tx, product.id, product.stock_quantity - quantity).await?;
            items.push(item);
        }
        tx.commit().await?;

        info!(
            order_number = %order.order_number,
            total_cents = order.total_cents,
            item_count = items.len(),
            "order created"
        );
        Ok(OrderWithItems { order, items })
    }

    /// Admin fulfillment update. Status transitions stamp shipped_at and
    /// delivered_at the first time the order enters those states; the
    /// timestamps are never cleared by later transitions.
    pub async fn update_fulfillment(
        pool: &SqlitePool,
        id: Uuid,
        data: UpdateOrder,
    ) -> Result<Order, OrderError> {
        let order = Order::find_by_id(pool, id).await?.ok_or(OrderError::NotFound)?;

        let status = data.status.unwrap_or(order.status);
        let payment_status = data.payment_status.unwrap_or(order.payment_status);
        let tracking_number = data.tracking_number.or(order.tracking_number);
        let notes = data.notes.or(order.notes);

        let now = Utc::now();
        let mut shipped_at = order.shipped_at;
        let mut delivered_at = order.delivered_at;
        if status == OrderStatus::Shipped && shipped_at.is_none() {
            shipped_at = Some(now);
        }
        if status == OrderStatus::Delivered {
            if shipped_at.is_none() {
                shipped_at = Some(now);
            }
            if delivered_at.is_none() {
                delivered_at = Some(now);
            }
        }

        let updated = Order::update_fulfillment(
            pool,
            id,
            status,
            payment_status,
            tracking_number,
            notes,
            shipped_at,
            delivered_at,
        )
        .await?;
        info!(
            order_number = %updated.order_number,
            status = %updated.status,
            payment_status = %updated.payment_status,
            "order fulfillment updated"
        );
        Ok(updated)
    }

    pub async fn find_for_user(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(Order::find_by_user(pool, user_id).await?)
    }

    pub async fn find_all(
        pool: &SqlitePool,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(Order::find_all(pool, status).await?)
    }

    pub async fn find_with_items(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<OrderWithItems, OrderError> {
        Order::find_with_items(pool, id)
            .await?
            .ok_or(OrderError::NotFound)
    }
}
