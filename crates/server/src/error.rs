use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    auth::AuthError, catalog::CatalogError, compare::CompareError, orders::OrderError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Access denied")]
    AccessDenied,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Compare(#[from] CompareError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AccessDenied => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Catalog(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Catalog(CatalogError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Catalog(_) => StatusCode::BAD_REQUEST,
            ApiError::Order(OrderError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Order(OrderError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Order(_) => StatusCode::BAD_REQUEST,
            ApiError::Compare(CompareError::ProductNotFound) => StatusCode::NOT_FOUND,
            ApiError::Compare(CompareError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Compare(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::InvalidCredentials | AuthError::InvalidSession) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Auth(AuthError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "internal error");
        }
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
