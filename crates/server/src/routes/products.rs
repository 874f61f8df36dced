//! Routes for catalog products.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    category::Category,
    product::{
        CreateProduct, Product, ProductFilters, ProductSort, ProductWithDetails, UpdateProduct,
    },
};
use serde::Deserialize;
use services::services::catalog::CatalogService;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::AdminUser};

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub is_new: Option<bool>,
    pub hot: Option<bool>,
    pub in_stock: Option<bool>,
    pub sort: Option<ProductSort>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// List catalog products, filtered by the storefront query parameters.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Product>>>, ApiError> {
    let pool = &state.db().pool;
    let category_id = match query.category.as_deref() {
        Some(slug) => Some(
            Category::find_by_slug(pool, slug)
                .await?
                .ok_or(ApiError::NotFound("category"))?
                .id,
        ),
        None => None,
    };
    let filters = ProductFilters {
        category_id,
        search: query.search,
        featured: query.featured,
        is_new: query.is_new,
        hot: query.hot,
        in_stock: query.in_stock,
        active_only: true,
        sort: query.sort.unwrap_or_default(),
        limit: query.limit.unwrap_or(50).clamp(1, 200),
        offset: query.offset.unwrap_or(0).max(0),
    };
    let products = Product::search(pool, &filters).await?;
    Ok(ResponseJson(ApiResponse::success(products)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<ProductWithDetails>>, ApiError> {
    let product = Product::find_details(&state.db().pool, id)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    Ok(ResponseJson(ApiResponse::success(product)))
}

pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ResponseJson<ApiResponse<ProductWithDetails>>, ApiError> {
    let pool = &state.db().pool;
    let product = Product::find_by_slug(pool, &slug)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    let details = Product::find_details(pool, product.id)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    Ok(ResponseJson(ApiResponse::success(details)))
}

pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    axum::Json(payload): axum::Json<CreateProduct>,
) -> Result<ResponseJson<ApiResponse<ProductWithDetails>>, ApiError> {
    let product = CatalogService::create_product(&state.db().pool, payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        product,
        "Product created",
    )))
}

/// Partial update: only supplied fields change. Renames keep slugs unique by
/// disambiguating instead of failing.
pub async fn update_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateProduct>,
) -> Result<ResponseJson<ApiResponse<ProductWithDetails>>, ApiError> {
    let product = CatalogService::update_product(&state.db().pool, id, payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        product,
        "Product updated",
    )))
}

pub async fn delete_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    CatalogService::delete_product(&state.db().pool, id).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Product deleted",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/products",
        Router::new()
            .route("/", get(list_products).post(create_product))
            .route("/slug/{slug}", get(get_product_by_slug))
            .route(
                "/{id}",
                get(get_product).put(update_product).delete(delete_product),
            ),
    )
}
