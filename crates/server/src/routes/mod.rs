pub mod admin;
pub mod auth;
pub mod categories;
pub mod compare;
pub mod health;
pub mod orders;
pub mod products;
pub mod wishlist;

use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(products::router())
        .merge(categories::router())
        .merge(orders::router())
        .merge(admin::router())
        .merge(auth::router())
        .merge(wishlist::router())
        .merge(compare::router())
        .merge(health::router())
}
