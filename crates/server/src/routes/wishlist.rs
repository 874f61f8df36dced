//! Wishlist routes. The store exposes an idempotent toggle plus a bulk clear.

use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{product::Product, wishlist::WishlistEntry};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::CurrentUser};

/// Wishlist entry joined with its product, for the wishlist page.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct WishlistItemResponse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub entry: WishlistEntry,
    pub product: Product,
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct ToggleWishlistRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct WishlistToggleResponse {
    pub added: bool,
    pub entries: Vec<WishlistEntry>,
}

pub async fn get_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ResponseJson<ApiResponse<Vec<WishlistItemResponse>>>, ApiError> {
    let pool = &state.db().pool;
    let entries = WishlistEntry::find_by_user(pool, user.id).await?;
    let ids: Vec<Uuid> = entries.iter().map(|e| e.product_id).collect();
    let products = Product::find_by_ids(pool, &ids).await?;
    let items = entries
        .into_iter()
        .filter_map(|entry| {
            products
                .iter()
                .find(|p| p.id == entry.product_id)
                .cloned()
                .map(|product| WishlistItemResponse { entry, product })
        })
        .collect();
    Ok(ResponseJson(ApiResponse::success(items)))
}

/// Add the product if absent, remove it otherwise.
pub async fn toggle_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    axum::Json(payload): axum::Json<ToggleWishlistRequest>,
) -> Result<ResponseJson<ApiResponse<WishlistToggleResponse>>, ApiError> {
    let pool = &state.db().pool;
    let added = if WishlistEntry::exists(pool, user.id, payload.product_id).await? {
        WishlistEntry::remove(pool, user.id, payload.product_id).await?;
        false
    } else {
        Product::find_by_id(pool, payload.product_id)
            .await?
            .ok_or(ApiError::NotFound("product"))?;
        WishlistEntry::insert(pool, user.id, payload.product_id).await?;
        true
    };
    let entries = WishlistEntry::find_by_user(pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success(WishlistToggleResponse {
        added,
        entries,
    })))
}

pub async fn clear_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    WishlistEntry::clear_for_user(&state.db().pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Wishlist cleared",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/wishlist",
        Router::new()
            .route("/", get(get_wishlist).delete(clear_wishlist))
            .route("/toggle", post(toggle_wishlist)),
    )
}
