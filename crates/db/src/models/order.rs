use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<Uuid>, // NULL for guest checkout
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64, // Invariant: subtotal + shipping + tax - discount
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub shipping_street: String,
    pub shipping_city: String,
    pub shipping_zip: String,
    pub shipping_country: String,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line item with name and unit price snapshotted at purchase time, so later
/// product edits never rewrite order history.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>, // NULLed if the product is later deleted
    pub product_name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub total_price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct OrderWithItems {
    #[serde(flatten)]
    #[ts(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl std::ops::Deref for OrderWithItems {
    type Target = Order;
    fn deref(&self) -> &Self::Target {
        &self.order
    }
}

/// Fields an admin may change on an order. Timestamps are stamped by the
/// orders service as a side effect of status transitions, not set directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateOrder {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, customer_name, customer_email, \
     customer_phone, status, payment_status, subtotal_cents, shipping_cents, tax_cents, \
     discount_cents, total_cents, tracking_number, notes, shipping_street, shipping_city, \
     shipping_zip, shipping_country, shipped_at, delivered_at, created_at, updated_at";

impl Order {
    /// Insert the order header. Runs inside the checkout transaction.
    pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            r#"INSERT INTO orders
                 (id, order_number, user_id, customer_name, customer_email, customer_phone,
                  status, payment_status, subtotal_cents, shipping_cents, tax_cents,
                  discount_cents, total_cents, tracking_number, notes, shipping_street,
                  shipping_city, shipping_zip, shipping_country)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
               RETURNING {ORDER_COLUMNS}"#
        ))
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.user_id)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(order.subtotal_cents)
        .bind(order.shipping_cents)
        .bind(order.tax_cents)
        .bind(order.discount_cents)
        .bind(order.total_cents)
        .bind(&order.tracking_number)
        .bind(&order.notes)
        .bind(&order.shipping_street)
        .bind(&order.shipping_city)
        .bind(&order.shipping_zip)
        .bind(&order.shipping_country)
        .fetch_one(conn)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_order_number(
        pool: &SqlitePool,
        order_number: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
        ))
        .bind(order_number)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_with_items(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<OrderWithItems>, sqlx::Error> {
        let Some(order) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let items = OrderItem::find_by_order(pool, id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    pub async fn find_by_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// All orders for the admin back-office, newest first, optionally filtered
    /// by status.
    pub async fn find_all(
        pool: &SqlitePool,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM orders
               WHERE ($1 IS NULL OR status = $1)
               ORDER BY created_at DESC"#
        ))
        .bind(status)
        .fetch_all(pool)
        .await
    }

    /// Persist an admin fulfillment update, including any transition-stamped
    /// timestamps computed by the orders service.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_fulfillment(
        pool: &SqlitePool,
        id: Uuid,
        status: OrderStatus,
        payment_status: PaymentStatus,
        tracking_number: Option<String>,
        notes: Option<String>,
        shipped_at: Option<DateTime<Utc>>,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            r#"UPDATE orders
               SET status = $2, payment_status = $3, tracking_number = $4, notes = $5,
                   shipped_at = $6, delivered_at = $7, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {ORDER_COLUMNS}"#
        ))
        .bind(id)
        .bind(status)
        .bind(payment_status)
        .bind(tracking_number)
        .bind(notes)
        .bind(shipped_at)
        .bind(delivered_at)
        .fetch_one(pool)
        .await
    }
}

impl OrderItem {
    /// Insert a line item. Runs inside the checkout transaction.
    pub async fn insert(conn: &mut SqliteConnection, item: &OrderItem) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO order_items
                 (id, order_id, product_id, product_name, unit_price_cents, quantity, total_price_cents)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(item.id)
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.unit_price_cents)
        .bind(item.quantity)
        .bind(item.total_price_cents)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn find_by_order(
        pool: &SqlitePool,
        order_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, order_id, product_id, product_name, unit_price_cents, quantity, total_price_cents
               FROM order_items
               WHERE order_id = $1
               ORDER BY product_name ASC"#,
        )
        .bind(order_id)
        .fetch_all(pool)
        .await
    }
}
