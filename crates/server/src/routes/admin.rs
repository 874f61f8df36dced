//! Admin back-office routes: order fulfillment, user management, and the
//! category cleanup diagnostics.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::{
    order::{Order, OrderStatus, OrderWithItems, UpdateOrder},
    product::Product,
    user::{AdminUpdateUser, User, UserWithOrderCount},
};
use serde::Deserialize;
use services::services::{catalog::CatalogService, orders::OrderService};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::AdminUser};

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

pub async fn list_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<OrderListQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Order>>>, ApiError> {
    let orders = OrderService::find_all(&state.db().pool, query.status).await?;
    Ok(ResponseJson(ApiResponse::success(orders)))
}

pub async fn get_order(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<OrderWithItems>>, ApiError> {
    let order = OrderService::find_with_items(&state.db().pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(order)))
}

/// Update order fulfillment. Entering shipped/delivered stamps the matching
/// timestamp as a side effect of the transition.
pub async fn update_order(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateOrder>,
) -> Result<ResponseJson<ApiResponse<Order>>, ApiError> {
    let order = OrderService::update_fulfillment(&state.db().pool, id, payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        order,
        "Order updated",
    )))
}

pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<ResponseJson<ApiResponse<Vec<UserWithOrderCount>>>, ApiError> {
    let users = User::find_all_with_order_counts(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

/// Toggle another account's admin/active flags.
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<AdminUpdateUser>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let pool = &state.db().pool;
    let user = User::find_by_id(pool, id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    let is_admin = payload.is_admin.unwrap_or(user.is_admin);
    let is_active = payload.is_active.unwrap_or(user.is_active);
    let updated = User::set_flags(pool, id, is_admin, is_active).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        updated,
        "User updated",
    )))
}

/// Diagnostic: list the products still attached to a category.
pub async fn category_cleanup_report(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Product>>>, ApiError> {
    let products = CatalogService::category_cleanup_report(&state.db().pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(products)))
}

/// Diagnostic: delete every product in a category, cascading each one.
pub async fn category_cleanup_purge(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<u64>>, ApiError> {
    let purged = CatalogService::purge_category_products(&state.db().pool, id).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        purged,
        format!("{purged} products removed"),
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/admin",
        Router::new()
            .route("/orders", get(list_orders))
            .route("/orders/{id}", get(get_order).put(update_order))
            .route("/users", get(list_users))
            .route("/users/{id}", put(update_user))
            .route(
                "/categories/{id}/cleanup",
                post(category_cleanup_report).delete(category_cleanup_purge),
            ),
    )
}
