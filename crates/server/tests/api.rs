//! End-to-end tests through the HTTP router: envelope shape, admin gating,
//! the category deletion flow, slug collisions, checkout, and the compare
//! rules.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use db::DBService;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use server::{AppState, app};
use tower::ServiceExt;

async fn test_app() -> Router {
    let db = DBService::new_in_memory().await.expect("in-memory db");
    app(AppState::new(db))
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

/// Register + log in a user; the first account becomes the bootstrap admin.
async fn login_token(app: &Router, email: &str, username: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "username": username,
            "password": "storefront-pw",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "identifier": username, "password": "storefront-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().expect("token").to_string()
}

async fn create_category(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/categories",
        Some(token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"].as_str().expect("category id").to_string()
}

async fn create_product(
    app: &Router,
    token: &str,
    name: &str,
    price_cents: i64,
    category_id: &str,
) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/products",
        Some(token),
        Some(json!({
            "name": name,
            "price_cents": price_cents,
            "category_id": category_id,
            "stock_quantity": 10,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"].as_str().expect("product id").to_string()
}

#[tokio::test]
async fn health_reports_the_success_envelope() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], "ok");
}

#[tokio::test]
async fn mutating_catalog_routes_are_admin_gated() {
    let app = test_app().await;
    let admin = login_token(&app, "admin@technomart.test", "admin").await;
    let shopper = login_token(&app, "shopper@technomart.test", "shopper").await;

    // anonymous
    let (status, body) = send(
        &app,
        "POST",
        "/api/categories",
        None,
        Some(json!({ "name": "Phones" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Access denied");

    // authenticated but not admin
    let (status, body) = send(
        &app,
        "POST",
        "/api/categories",
        Some(&shopper),
        Some(json!({ "name": "Phones" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied");

    // admin succeeds
    let (status, _) = send(
        &app,
        "POST",
        "/api/categories",
        Some(&admin),
        Some(json!({ "name": "Phones" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // admin listings reject non-admins too
    let (status, _) = send(&app, "GET", "/api/admin/orders", Some(&shopper), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_ids_yield_not_found_envelopes() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "GET",
        "/api/products/00000000-0000-0000-0000-000000000000",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "product not found");
}

#[tokio::test]
async fn empty_category_deletes_and_disappears_from_the_listing() {
    let app = test_app().await;
    let admin = login_token(&app, "admin@technomart.test", "admin").await;
    let phones = create_category(&app, &admin, "Phones").await;

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/categories/{phones}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(&app, "GET", "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["data"].as_array().expect("category list");
    assert!(listed.iter().all(|c| c["id"] != Value::String(phones.clone())));
}

#[tokio::test]
async fn populated_category_deletion_is_a_two_step_flow() {
    let app = test_app().await;
    let admin = login_token(&app, "admin@technomart.test", "admin").await;
    let laptops = create_category(&app, &admin, "Laptops").await;
    let electronics = create_category(&app, &admin, "Electronics").await;
    for name in ["ThinkPad X1", "MacBook Air", "XPS 13"] {
        create_product(&app, &admin, name, 1299_00, &laptops).await;
    }

    // step one: no target, rejected with an instructive error
    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/categories/{laptops}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let error = body["error"].as_str().expect("error message");
    assert!(error.contains("3 products"), "unexpected error: {error}");

    // self-target rejected
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/categories/{laptops}?moveTo={laptops}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // step two: valid target, products move atomically
    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/categories/{laptops}?moveTo={electronics}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reassigned_products"], 3);

    let (status, body) = send(&app, "GET", "/api/products?category=electronics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().expect("products").len(), 3);
}

#[tokio::test]
async fn renaming_over_an_existing_slug_disambiguates() {
    let app = test_app().await;
    let admin = login_token(&app, "admin@technomart.test", "admin").await;
    let phones = create_category(&app, &admin, "Phones").await;
    create_product(&app, &admin, "iPhone 15", 799_00, &phones).await;
    let other = create_product(&app, &admin, "Galaxy S24", 849_00, &phones).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/products/{other}"),
        Some(&admin),
        Some(json!({ "name": "iPhone 15" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let slug = body["data"]["slug"].as_str().expect("slug");
    assert_ne!(slug, "iphone-15");
    assert!(slug.starts_with("iphone-15-"));
}

#[tokio::test]
async fn guest_checkout_and_admin_fulfillment_roundtrip() {
    let app = test_app().await;
    let admin = login_token(&app, "admin@technomart.test", "admin").await;
    let phones = create_category(&app, &admin, "Phones").await;
    let phone = create_product(&app, &admin, "iPhone 15", 799_00, &phones).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        None,
        Some(json!({
            "customer_name": "Ada Lovelace",
            "customer_email": "ada@example.com",
            "shipping_address": {
                "street": "12 Analytical Way",
                "city": "London",
                "zip_code": "EC1A 1AA",
                "country": "UK",
            },
            "items": [{ "product_id": phone, "quantity": 2 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let order_id = body["data"]["id"].as_str().expect("order id").to_string();
    let subtotal = body["data"]["subtotal_cents"].as_i64().expect("subtotal");
    let shipping = body["data"]["shipping_cents"].as_i64().expect("shipping");
    let tax = body["data"]["tax_cents"].as_i64().expect("tax");
    let discount = body["data"]["discount_cents"].as_i64().expect("discount");
    let total = body["data"]["total_cents"].as_i64().expect("total");
    assert_eq!(subtotal, 2 * 799_00);
    assert_eq!(total, subtotal + shipping + tax - discount);

    let (status, body) = send(&app, "GET", "/api/admin/orders", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().expect("orders").len(), 1);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/admin/orders/{order_id}"),
        Some(&admin),
        Some(json!({ "status": "shipped", "tracking_number": "1Z999" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "shipped");
    assert!(body["data"]["shipped_at"].is_string());
    assert!(body["data"]["delivered_at"].is_null());
}

#[tokio::test]
async fn order_history_requires_a_session() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied");
}

#[tokio::test]
async fn wishlist_toggle_is_idempotent_over_http() {
    let app = test_app().await;
    let admin = login_token(&app, "admin@technomart.test", "admin").await;
    let phones = create_category(&app, &admin, "Phones").await;
    let phone = create_product(&app, &admin, "iPhone 15", 799_00, &phones).await;
    let shopper = login_token(&app, "shopper@technomart.test", "shopper").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/wishlist/toggle",
        Some(&shopper),
        Some(json!({ "product_id": phone })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["added"], true);
    assert_eq!(body["data"]["entries"].as_array().expect("entries").len(), 1);

    let (status, body) = send(
        &app,
        "POST",
        "/api/wishlist/toggle",
        Some(&shopper),
        Some(json!({ "product_id": phone })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["added"], false);
    assert!(body["data"]["entries"].as_array().expect("entries").is_empty());
}

#[tokio::test]
async fn compare_rules_surface_as_validation_errors() {
    let app = test_app().await;
    let admin = login_token(&app, "admin@technomart.test", "admin").await;
    let phones = create_category(&app, &admin, "Phones").await;
    let laptops = create_category(&app, &admin, "Laptops").await;
    let shopper = login_token(&app, "shopper@technomart.test", "shopper").await;

    let mut phone_ids = Vec::new();
    for name in ["iPhone 15", "Pixel 9", "Galaxy S24", "Xperia 1", "Nothing 2"] {
        phone_ids.push(create_product(&app, &admin, name, 799_00, &phones).await);
    }
    let laptop = create_product(&app, &admin, "MacBook Air", 1199_00, &laptops).await;

    for id in &phone_ids[..4] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/compare",
            Some(&shopper),
            Some(json!({ "product_id": id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        "POST",
        "/api/compare",
        Some(&shopper),
        Some(json!({ "product_id": phone_ids[4] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().expect("error").contains("4 products"));

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/compare/{}", phone_ids[0]),
        Some(&shopper),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // still one category only
    let (status, body) = send(
        &app,
        "POST",
        "/api/compare",
        Some(&shopper),
        Some(json!({ "product_id": laptop })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().expect("error").contains("same category"));
}
