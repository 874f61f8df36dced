//! Routes for catalog categories, including the guarded two-step deletion
//! flow: deleting a non-empty category is rejected until the caller names a
//! target category to move its products to.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    category::{Category, CategoryWithCount, CreateCategory, UpdateCategory},
    product::Product,
};
use serde::Deserialize;
use services::services::catalog::{CatalogService, CategoryDeletion};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::AdminUser};

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<CategoryWithCount>>>, ApiError> {
    let categories = CatalogService::list_categories(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(categories)))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<CategoryWithCount>>, ApiError> {
    let pool = &state.db().pool;
    let category = Category::find_by_id(pool, id)
        .await?
        .ok_or(ApiError::NotFound("category"))?;
    let product_count = Product::count_by_category(pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(CategoryWithCount {
        category,
        product_count,
    })))
}

pub async fn create_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    axum::Json(payload): axum::Json<CreateCategory>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    let category = CatalogService::create_category(&state.db().pool, payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        category,
        "Category created",
    )))
}

pub async fn update_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateCategory>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    let category = CatalogService::update_category(&state.db().pool, id, payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        category,
        "Category updated",
    )))
}

#[derive(Debug, Deserialize)]
pub struct DeleteCategoryQuery {
    #[serde(rename = "moveTo")]
    pub move_to: Option<Uuid>,
}

/// Delete a category. With products still attached, the request must carry
/// `?moveTo=<category id>`; the server validates the target and performs the
/// reassignment and deletion atomically.
pub async fn delete_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteCategoryQuery>,
) -> Result<ResponseJson<ApiResponse<CategoryDeletion>>, ApiError> {
    let deletion = CatalogService::delete_category(&state.db().pool, id, query.move_to).await?;
    let message = match deletion.moved_to {
        Some(_) => format!(
            "Category deleted; {} products moved",
            deletion.reassigned_products
        ),
        None => "Category deleted".to_string(),
    };
    Ok(ResponseJson(ApiResponse::success_with_message(
        deletion, message,
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/categories",
        Router::new()
            .route("/", get(list_categories).post(create_category))
            .route(
                "/{id}",
                get(get_category)
                    .put(update_category)
                    .delete(delete_category),
            ),
    )
}
