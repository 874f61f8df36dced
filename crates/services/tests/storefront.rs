//! Service-level tests against an in-memory database: derived product
//! fields, the category deletion flow, checkout totals, order lifecycle
//! stamping, and the compare rules.

use db::{
    DBService,
    models::{
        category::{Category, CreateCategory},
        order::{OrderStatus, UpdateOrder},
        product::{CreateProduct, Product, ProductImage, ProductSpecification,
            ProductSpecificationInput, ProductWithDetails, UpdateProduct},
        user::CreateUser,
        wishlist::WishlistEntry,
    },
};
use services::services::{
    auth::{AuthError, AuthService},
    catalog::{CatalogError, CatalogService},
    compare::{CompareError, CompareService},
    orders::{CheckoutItem, CheckoutRequest, OrderService, ShippingAddress},
};
use uuid::Uuid;

async fn setup() -> DBService {
    DBService::new_in_memory().await.expect("in-memory db")
}

async fn make_category(db: &DBService, name: &str) -> Category {
    CatalogService::create_category(
        &db.pool,
        CreateCategory {
            name: name.to_string(),
            description: None,
            parent_id: None,
            sort_order: None,
            image_url: None,
        },
    )
    .await
    .expect("create category")
}

fn product_payload(name: &str, price_cents: i64, category_id: Uuid) -> CreateProduct {
    CreateProduct {
        name: name.to_string(),
        description: None,
        price_cents,
        original_price_cents: None,
        category_id,
        brand_id: None,
        sku: None,
        stock_quantity: Some(10),
        is_active: None,
        is_featured: None,
        is_new: None,
        is_hot: None,
        images: None,
        specifications: None,
    }
}

async fn make_product(
    db: &DBService,
    name: &str,
    price_cents: i64,
    category_id: Uuid,
) -> ProductWithDetails {
    CatalogService::create_product(&db.pool, product_payload(name, price_cents, category_id))
        .await
        .expect("create product")
}

fn checkout_payload(items: Vec<CheckoutItem>) -> CheckoutRequest {
    CheckoutRequest {
        customer_name: "Ada Lovelace".to_string(),
        customer_email: "ada@example.com".to_string(),
        customer_phone: None,
        shipping_address: ShippingAddress {
            street: "12 Analytical Way".to_string(),
            city: "London".to_string(),
            zip_code: "EC1A 1AA".to_string(),
            country: "UK".to_string(),
        },
        items,
        notes: None,
    }
}

async fn make_user(db: &DBService, email: &str, username: &str) -> db::models::user::User {
    AuthService::register(
        &db.pool,
        CreateUser {
            email: email.to_string(),
            username: username.to_string(),
            password: "correct-horse".to_string(),
            first_name: None,
            last_name: None,
            phone: None,
        },
    )
    .await
    .expect("register user")
}

#[tokio::test]
async fn creating_a_product_derives_slug_discount_and_stock_state() {
    let db = setup().await;
    let phones = make_category(&db, "Phones").await;

    let mut payload = product_payload("iPhone 15 Pro", 999_00, phones.id);
    payload.original_price_cents = Some(1199_00);
    payload.stock_quantity = Some(0);
    let product = CatalogService::create_product(&db.pool, payload)
        .await
        .expect("create");

    assert_eq!(product.slug, "iphone-15-pro");
    // round((119900 - 99900) / 119900 * 100) = round(16.68) = 17
    assert_eq!(product.discount_percent, Some(17));
    assert!(!product.in_stock);
}

#[tokio::test]
async fn renaming_to_a_colliding_name_disambiguates_the_slug() {
    let db = setup().await;
    let phones = make_category(&db, "Phones").await;
    let original = make_product(&db, "iPhone 15", 799_00, phones.id).await;
    let other = make_product(&db, "Galaxy S24", 849_00, phones.id).await;

    let renamed = CatalogService::update_product(
        &db.pool,
        other.product.id,
        UpdateProduct {
            name: Some("iPhone 15".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("rename succeeds despite the collision");

    assert_ne!(renamed.slug, original.slug);
    assert!(renamed.slug.starts_with("iphone-15-"));
}

#[tokio::test]
async fn partial_update_rederives_stock_and_discount() {
    let db = setup().await;
    let phones = make_category(&db, "Phones").await;
    let mut payload = product_payload("Pixel 9", 699_00, phones.id);
    payload.original_price_cents = Some(799_00);
    payload.stock_quantity = Some(0);
    let created = CatalogService::create_product(&db.pool, payload)
        .await
        .expect("create");
    assert_eq!(created.discount_percent, Some(13));
    assert!(!created.in_stock);

    let updated = CatalogService::update_product(
        &db.pool,
        created.product.id,
        UpdateProduct {
            stock_quantity: Some(5),
            ..Default::default()
        },
    )
    .await
    .expect("update stock");
    assert!(updated.in_stock);
    // untouched fields survive the partial update
    assert_eq!(updated.price_cents, 699_00);
    assert_eq!(updated.discount_percent, Some(13));

    // an explicit null original price ends the sale and clears the discount
    let cleared = CatalogService::update_product(
        &db.pool,
        created.product.id,
        UpdateProduct {
            original_price_cents: Some(None),
            ..Default::default()
        },
    )
    .await
    .expect("clear original price");
    assert_eq!(cleared.original_price_cents, None);
    assert_eq!(cleared.discount_percent, None);
}

#[tokio::test]
async fn deleting_a_product_cascades_to_children() {
    let db = setup().await;
    let phones = make_category(&db, "Phones").await;
    let mut payload = product_payload("iPhone 15", 799_00, phones.id);
    payload.specifications = Some(vec![ProductSpecificationInput {
        group_name: "Display".to_string(),
        name: "Size".to_string(),
        value: "6.1\"".to_string(),
    }]);
    let product = CatalogService::create_product(&db.pool, payload)
        .await
        .expect("create");
    let product_id = product.product.id;

    let user = make_user(&db, "ada@example.com", "ada").await;
    WishlistEntry::insert(&db.pool, user.id, product_id)
        .await
        .expect("wishlist entry");

    CatalogService::delete_product(&db.pool, product_id)
        .await
        .expect("delete");

    assert!(Product::find_by_id(&db.pool, product_id).await.unwrap().is_none());
    assert!(ProductImage::find_by_product(&db.pool, product_id)
        .await
        .unwrap()
        .is_empty());
    assert!(ProductSpecification::find_by_product(&db.pool, product_id)
        .await
        .unwrap()
        .is_empty());
    assert!(WishlistEntry::find_by_user(&db.pool, user.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn empty_category_deletes_directly() {
    let db = setup().await;
    let phones = make_category(&db, "Phones").await;

    let deletion = CatalogService::delete_category(&db.pool, phones.id, None)
        .await
        .expect("empty category deletes without a target");
    assert_eq!(deletion.reassigned_products, 0);
    assert!(Category::find_by_id(&db.pool, phones.id).await.unwrap().is_none());
}

#[tokio::test]
async fn non_empty_category_requires_a_valid_target() {
    let db = setup().await;
    let laptops = make_category(&db, "Laptops").await;
    let electronics = make_category(&db, "Electronics").await;
    for name in ["ThinkPad X1", "MacBook Air", "XPS 13"] {
        make_product(&db, name, 1299_00, laptops.id).await;
    }

    // no target: rejected with the product count so the client can prompt
    let err = CatalogService::delete_category(&db.pool, laptops.id, None)
        .await
        .expect_err("must be rejected");
    assert!(matches!(err, CatalogError::CategoryNotEmpty { product_count: 3 }));

    // target == source: rejected
    let err = CatalogService::delete_category(&db.pool, laptops.id, Some(laptops.id))
        .await
        .expect_err("self-target must be rejected");
    assert!(matches!(err, CatalogError::Validation(_)));

    // nonexistent target: rejected, nothing changed
    let err = CatalogService::delete_category(&db.pool, laptops.id, Some(Uuid::new_v4()))
        .await
        .expect_err("unknown target must be rejected");
    assert!(matches!(err, CatalogError::Validation(_)));
    assert!(Category::find_by_id(&db.pool, laptops.id).await.unwrap().is_some());
    assert_eq!(Product::count_by_category(&db.pool, laptops.id).await.unwrap(), 3);

    // valid target: products move and the source disappears, atomically
    let deletion =
        CatalogService::delete_category(&db.pool, laptops.id, Some(electronics.id))
            .await
            .expect("delete with reassignment");
    assert_eq!(deletion.reassigned_products, 3);
    assert!(Category::find_by_id(&db.pool, laptops.id).await.unwrap().is_none());
    assert_eq!(
        Product::count_by_category(&db.pool, electronics.id).await.unwrap(),
        3
    );
    assert_eq!(Product::count_by_category(&db.pool, laptops.id).await.unwrap(), 0);
}

#[tokio::test]
async fn deleting_a_category_detaches_its_children() {
    let db = setup().await;
    let parent = make_category(&db, "Computers").await;
    let child = CatalogService::create_category(
        &db.pool,
        CreateCategory {
            name: "Laptops".to_string(),
            description: None,
            parent_id: Some(parent.id),
            sort_order: None,
            image_url: None,
        },
    )
    .await
    .expect("child category");

    CatalogService::delete_category(&db.pool, parent.id, None)
        .await
        .expect("delete parent");
    let orphan = Category::find_by_id(&db.pool, child.id)
        .await
        .unwrap()
        .expect("child survives");
    assert_eq!(orphan.parent_id, None);
}

#[tokio::test]
async fn checkout_snapshots_prices_and_upholds_the_total_invariant() {
    let db = setup().await;
    let phones = make_category(&db, "Phones").await;
    let phone = make_product(&db, "iPhone 15", 799_00, phones.id).await;
    let case = make_product(&db, "Leather Case", 19_99, phones.id).await;

    let order = OrderService::checkout(
        &db.pool,
        None,
        checkout_payload(vec![
            CheckoutItem {
                product_id: phone.product.id,
                quantity: 1,
            },
            CheckoutItem {
                product_id: case.product.id,
                quantity: 2,
            },
        ]),
    )
    .await
    .expect("checkout");

    let subtotal = 799_00 + 2 * 19_99;
    assert_eq!(order.subtotal_cents, subtotal);
    assert_eq!(order.shipping_cents, 0); // above the free-shipping threshold
    assert_eq!(
        order.total_cents,
        order.subtotal_cents + order.shipping_cents + order.tax_cents - order.discount_cents
    );
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.order_number.starts_with("TM-"));

    // stock was decremented inside the transaction
    let phone_after = Product::find_by_id(&db.pool, phone.product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(phone_after.stock_quantity, 9);

    // a later price change must not rewrite the snapshot
    CatalogService::update_product(
        &db.pool,
        phone.product.id,
        UpdateProduct {
            price_cents: Some(599_00),
            ..Default::default()
        },
    )
    .await
    .expect("reprice");
    let fetched = OrderService::find_with_items(&db.pool, order.order.id)
        .await
        .expect("reload order");
    let line = fetched
        .items
        .iter()
        .find(|i| i.product_id == Some(phone.product.id))
        .expect("phone line");
    assert_eq!(line.unit_price_cents, 799_00);
    assert_eq!(line.total_price_cents, 799_00);
}

#[tokio::test]
async fn checkout_charges_flat_shipping_below_the_threshold() {
    let db = setup().await;
    let phones = make_category(&db, "Accessories").await;
    let cable = make_product(&db, "USB-C Cable", 12_00, phones.id).await;

    let order = OrderService::checkout(
        &db.pool,
        None,
        checkout_payload(vec![CheckoutItem {
            product_id: cable.product.id,
            quantity: 1,
        }]),
    )
    .await
    .expect("checkout");
    assert_eq!(order.shipping_cents, 9_99);
    assert_eq!(order.total_cents, 12_00 + 9_99);
}

#[tokio::test]
async fn checkout_rejects_insufficient_stock() {
    let db = setup().await;
    let phones = make_category(&db, "Phones").await;
    let phone = make_product(&db, "iPhone 15", 799_00, phones.id).await;

    let err = OrderService::checkout(
        &db.pool,
        None,
        checkout_payload(vec![CheckoutItem {
            product_id: phone.product.id,
            quantity: 11,
        }]),
    )
    .await
    .expect_err("only 10 in stock");
    assert!(matches!(
        err,
        services::services::orders::OrderError::InsufficientStock { available: 10, .. }
    ));

    // nothing was committed
    let after = Product::find_by_id(&db.pool, phone.product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.stock_quantity, 10);
}

#[tokio::test]
async fn status_transitions_stamp_fulfillment_timestamps() {
    let db = setup().await;
    let phones = make_category(&db, "Phones").await;
    let phone = make_product(&db, "iPhone 15", 799_00, phones.id).await;
    let order = OrderService::checkout(
        &db.pool,
        None,
        checkout_payload(vec![CheckoutItem {
            product_id: phone.product.id,
            quantity: 1,
        }]),
    )
    .await
    .expect("checkout");
    assert!(order.shipped_at.is_none());

    let shipped = OrderService::update_fulfillment(
        &db.pool,
        order.order.id,
        UpdateOrder {
            status: Some(OrderStatus::Shipped),
            tracking_number: Some("1Z999".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("ship");
    let shipped_at = shipped.shipped_at.expect("stamped on transition");
    assert!(shipped.delivered_at.is_none());

    let delivered = OrderService::update_fulfillment(
        &db.pool,
        order.order.id,
        UpdateOrder {
            status: Some(OrderStatus::Delivered),
            ..Default::default()
        },
    )
    .await
    .expect("deliver");
    assert!(delivered.delivered_at.is_some());
    // the original shipped timestamp survives later transitions
    assert_eq!(delivered.shipped_at, Some(shipped_at));
    assert_eq!(delivered.tracking_number.as_deref(), Some("1Z999"));
}

#[tokio::test]
async fn compare_enforces_cardinality_and_single_category() {
    let db = setup().await;
    let phones = make_category(&db, "Phones").await;
    let laptops = make_category(&db, "Laptops").await;
    let user = make_user(&db, "ada@example.com", "ada").await;

    let mut phone_ids = Vec::new();
    for name in ["iPhone 15", "Pixel 9", "Galaxy S24", "Xperia 1", "Nothing 2"] {
        phone_ids.push(make_product(&db, name, 799_00, phones.id).await.product.id);
    }
    let laptop = make_product(&db, "MacBook Air", 1199_00, laptops.id).await;

    CompareService::add(&db.pool, user.id, phone_ids[0])
        .await
        .expect("first product");

    // a different category is rejected while entries remain
    let err = CompareService::add(&db.pool, user.id, laptop.product.id)
        .await
        .expect_err("category mismatch");
    assert!(matches!(err, CompareError::CategoryMismatch));

    for id in &phone_ids[1..4] {
        CompareService::add(&db.pool, user.id, *id).await.expect("fills up to four");
    }

    let err = CompareService::add(&db.pool, user.id, phone_ids[4])
        .await
        .expect_err("fifth product");
    assert!(matches!(err, CompareError::ListFull));

    // re-adding an existing member stays a no-op success
    let entries = CompareService::add(&db.pool, user.id, phone_ids[0])
        .await
        .expect("idempotent re-add");
    assert_eq!(entries.len(), 4);

    // once cleared, the other category becomes valid again
    CompareService::clear(&db.pool, user.id).await.expect("clear");
    CompareService::add(&db.pool, user.id, laptop.product.id)
        .await
        .expect("laptop after clear");
}

#[tokio::test]
async fn comparison_table_flags_spec_differences() {
    let db = setup().await;
    let phones = make_category(&db, "Phones").await;
    let user = make_user(&db, "ada@example.com", "ada").await;

    let mut a = product_payload("iPhone 15", 799_00, phones.id);
    a.specifications = Some(vec![
        ProductSpecificationInput {
            group_name: "Display".to_string(),
            name: "Size".to_string(),
            value: "6.1\"".to_string(),
        },
        ProductSpecificationInput {
            group_name: "Battery".to_string(),
            name: "Capacity".to_string(),
            value: "3349 mAh".to_string(),
        },
    ]);
    let mut b = product_payload("Pixel 9", 699_00, phones.id);
    b.specifications = Some(vec![
        ProductSpecificationInput {
            group_name: "Display".to_string(),
            name: "Size".to_string(),
            value: "6.1\"".to_string(),
        },
        ProductSpecificationInput {
            group_name: "Battery".to_string(),
            name: "Capacity".to_string(),
            value: "4700 mAh".to_string(),
        },
    ]);
    let a = CatalogService::create_product(&db.pool, a).await.expect("a");
    let b = CatalogService::create_product(&db.pool, b).await.expect("b");

    CompareService::add(&db.pool, user.id, a.product.id).await.expect("add a");
    CompareService::add(&db.pool, user.id, b.product.id).await.expect("add b");

    let table = CompareService::comparison_table(&db.pool, user.id)
        .await
        .expect("table");
    assert_eq!(table.products.len(), 2);

    let display = table
        .groups
        .iter()
        .find(|g| g.group_name == "Display")
        .expect("display group");
    let size = display.rows.iter().find(|r| r.name == "Size").expect("size row");
    assert!(!size.has_differences);

    let battery = table
        .groups
        .iter()
        .find(|g| g.group_name == "Battery")
        .expect("battery group");
    let capacity = battery
        .rows
        .iter()
        .find(|r| r.name == "Capacity")
        .expect("capacity row");
    assert!(capacity.has_differences);
}

#[tokio::test]
async fn registration_bootstraps_the_first_admin_and_rejects_duplicates() {
    let db = setup().await;
    let first = make_user(&db, "ada@example.com", "ada").await;
    assert!(first.is_admin);
    let second = make_user(&db, "grace@example.com", "grace").await;
    assert!(!second.is_admin);

    let err = AuthService::register(
        &db.pool,
        CreateUser {
            email: "ada@example.com".to_string(),
            username: "ada2".to_string(),
            password: "correct-horse".to_string(),
            first_name: None,
            last_name: None,
            phone: None,
        },
    )
    .await
    .expect_err("duplicate email");
    assert!(matches!(err, AuthError::DuplicateIdentity));
}

#[tokio::test]
async fn login_issues_a_token_that_authenticates() {
    let db = setup().await;
    let user = make_user(&db, "ada@example.com", "ada").await;

    let auth = AuthService::login(&db.pool, "ada", "correct-horse")
        .await
        .expect("login by username");
    assert_eq!(auth.user.id, user.id);

    let resolved = AuthService::authenticate(&db.pool, &auth.token)
        .await
        .expect("token resolves");
    assert_eq!(resolved.id, user.id);

    let err = AuthService::login(&db.pool, "ada", "wrong-password")
        .await
        .expect_err("bad password");
    assert!(matches!(err, AuthError::InvalidCredentials));

    AuthService::logout(&db.pool, &auth.token).await.expect("logout");
    let err = AuthService::authenticate(&db.pool, &auth.token)
        .await
        .expect_err("token revoked");
    assert!(matches!(err, AuthError::InvalidSession));
}
