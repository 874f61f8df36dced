//! Compare routes. Insertion rules (max four products, single category) are
//! enforced server-side by the compare service.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use db::models::compare::CompareEntry;
use serde::{Deserialize, Serialize};
use services::services::compare::{CompareService, ComparisonTable};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::CurrentUser};

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct AddCompareRequest {
    pub product_id: Uuid,
}

pub async fn get_comparison(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ResponseJson<ApiResponse<ComparisonTable>>, ApiError> {
    let table = CompareService::comparison_table(&state.db().pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success(table)))
}

pub async fn add_to_compare(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    axum::Json(payload): axum::Json<AddCompareRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<CompareEntry>>>, ApiError> {
    let entries = CompareService::add(&state.db().pool, user.id, payload.product_id).await?;
    Ok(ResponseJson(ApiResponse::success(entries)))
}

pub async fn remove_from_compare(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<CompareEntry>>>, ApiError> {
    let entries = CompareService::remove(&state.db().pool, user.id, product_id).await?;
    Ok(ResponseJson(ApiResponse::success(entries)))
}

pub async fn clear_compare(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    CompareService::clear(&state.db().pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Compare list cleared",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/compare",
        Router::new()
            .route("/", get(get_comparison).post(add_to_compare).delete(clear_compare))
            .route("/{product_id}", delete(remove_from_compare)),
    )
}
