//! Storefront order routes: checkout and order history.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::order::{Order, OrderWithItems};
use services::services::orders::{CheckoutRequest, OrderService};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extractors::{CurrentUser, MaybeUser},
};

/// Create an order from the posted cart contents. Guests may check out; when
/// a session is present the order is linked to the account.
pub async fn checkout(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    axum::Json(payload): axum::Json<CheckoutRequest>,
) -> Result<ResponseJson<ApiResponse<OrderWithItems>>, ApiError> {
    let order =
        OrderService::checkout(&state.db().pool, user.map(|u| u.id), payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        order,
        "Order placed",
    )))
}

pub async fn list_my_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ResponseJson<ApiResponse<Vec<Order>>>, ApiError> {
    let orders = OrderService::find_for_user(&state.db().pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success(orders)))
}

/// Fetch one order with its items. Owners see their own orders; admins see
/// everything.
pub async fn get_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<OrderWithItems>>, ApiError> {
    let order = OrderService::find_with_items(&state.db().pool, id).await?;
    if order.order.user_id != Some(user.id) && !user.is_admin {
        return Err(ApiError::AccessDenied);
    }
    Ok(ResponseJson(ApiResponse::success(order)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/orders",
        Router::new()
            .route("/", post(checkout).get(list_my_orders))
            .route("/{id}", get(get_order)),
    )
}
