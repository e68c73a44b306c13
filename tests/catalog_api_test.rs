//! Catalog browsing, product pages, reviews, wishlists, the account page
//! and the staff catalog screens.

mod common;

use axum::http::{Method, StatusCode};
use backyard_api::services::commerce::product_catalog_service::CreateProductInput;
use common::{money, Caller, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

fn names(products: &Value) -> Vec<String> {
    products
        .as_array()
        .expect("product list")
        .iter()
        .filter_map(|p| p["name"].as_str().map(str::to_string))
        .collect()
}

async fn shop(app: &TestApp, query: &str) -> (StatusCode, Value) {
    app.call(
        Method::GET,
        &format!("/api/v1/shop{}", query),
        None,
        &Caller::Anonymous,
    )
    .await
}

async fn buy(app: &TestApp, caller: &Caller, address: Uuid, product_id: Uuid) {
    app.call(
        Method::POST,
        &format!("/api/v1/cart/add/{}", product_id),
        Some(json!({ "quantity": 1 })),
        caller,
    )
    .await;
    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/checkout",
            Some(json!({
                "shipping_address_id": address,
                "billing_address_id": address,
                "shipping_method": "standard",
                "payment_method": "bank_transfer"
            })),
            caller,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn shop_lists_active_products_by_name() {
    let app = TestApp::new().await;
    app.seed_product("Rattan Sofa", "SOF-1", dec!(900), 2).await;
    app.seed_product("Acacia Stool", "STL-1", dec!(60), 2).await;
    let hidden = app.seed_product("Old Hammock", "HAM-1", dec!(80), 2).await;
    app.call(
        Method::DELETE,
        &format!("/api/v1/admin/products/{}", hidden.id),
        None,
        &Caller::Anonymous,
    )
    .await;

    let (status, body) = shop(&app, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["data"]["products"]), vec!["Acacia Stool", "Rattan Sofa"]);
    assert_eq!(body["data"]["categories"][0]["slug"], "patio-chairs");
    assert_eq!(body["data"]["materials"][0]["name"], "Teak");
}

#[tokio::test]
async fn shop_filters_and_sorts() {
    let app = TestApp::new().await;
    app.seed_product("Rattan Sofa", "SOF-1", dec!(900), 2).await;
    app.seed_product("Acacia Stool", "STL-1", dec!(60), 2).await;
    app.seed_product("Teak Bench", "BEN-1", dec!(300), 2).await;

    let (_, body) = shop(&app, "?sort=price_high").await;
    assert_eq!(
        names(&body["data"]["products"]),
        vec!["Rattan Sofa", "Teak Bench", "Acacia Stool"]
    );

    let (_, body) = shop(&app, "?sort=price_low&min_price=100&max_price=900").await;
    assert_eq!(names(&body["data"]["products"]), vec!["Teak Bench", "Rattan Sofa"]);

    let (_, body) = shop(&app, "?category=patio-chairs").await;
    assert_eq!(body["data"]["products"].as_array().map(Vec::len), Some(3));

    let (_, body) = shop(&app, &format!("?material={}", Uuid::new_v4())).await;
    assert_eq!(body["data"]["products"].as_array().map(Vec::len), Some(0));

    let (status, _) = shop(&app, "?category=no-such-thing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sale_price_shows_on_cards() {
    let app = TestApp::new().await;
    let mut input = sample_product(&app, "Deck Chair", "DCK-1", dec!(200));
    input.sale_price = Some(dec!(150));
    app.seed_product_with(input).await;

    let (_, body) = shop(&app, "").await;
    let card = &body["data"]["products"][0];
    assert_eq!(card["on_sale"], true);
    assert_eq!(money(&card["effective_price"]), dec!(150));
}

fn sample_product(app: &TestApp, name: &str, sku: &str, price: Decimal) -> CreateProductInput {
    CreateProductInput {
        name: name.to_string(),
        slug: None,
        description: None,
        category_id: app.category.id,
        material_id: app.material.id,
        price,
        sale_price: None,
        weight: None,
        width: None,
        height: None,
        depth: None,
        assembly_required: None,
        weather_resistant: None,
        sku: sku.to_string(),
        is_active: None,
        featured: None,
        warranty_months: None,
    }
}

#[tokio::test]
async fn home_feed_shows_featured_products() {
    let app = TestApp::new().await;
    let mut input = sample_product(&app, "Hero Lounger", "LNG-1", dec!(700));
    input.featured = Some(true);
    app.seed_product_with(input).await;
    app.seed_product("Plain Stool", "STL-1", dec!(50), 1).await;

    let (status, body) = app.call(Method::GET, "/api/v1", None, &Caller::Anonymous).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["data"]["featured_products"]), vec!["Hero Lounger"]);
    assert_eq!(body["data"]["new_arrivals"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn product_page_by_slug() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(120), 6).await;
    app.seed_product("Teak Table", "TBL-1", dec!(450), 1).await;

    let (status, body) = app
        .call(Method::GET, "/api/v1/shop/product/teak-chair", None, &Caller::Anonymous)
        .await;
    assert_eq!(status, StatusCode::OK);
    let detail = &body["data"];
    assert_eq!(detail["product"]["id"], json!(chair.id));
    assert_eq!(detail["inventory"][0]["warehouse_name"], "Main Warehouse");
    assert_eq!(detail["inventory"][0]["available_quantity"], 6);
    assert_eq!(names(&detail["related_products"]), vec!["Teak Table"]);
    assert_eq!(detail["in_wishlist"], false);
    assert_eq!(money(&detail["average_rating"]), Decimal::ZERO);

    let (status, _) = app
        .call(Method::GET, "/api/v1/shop/product/nothing-here", None, &Caller::Anonymous)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reviews_are_one_per_customer_and_marked_verified() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(120), 6).await;
    app.seed_product("Teak Table", "TBL-1", dec!(450), 6).await;
    let (customer, address) = app.seed_customer("reviewer@example.com").await;
    let caller = Caller::Customer(customer.id);
    buy(&app, &caller, address, chair.id).await;

    let review = json!({ "rating": 5, "title": "Lovely", "comment": "Survived a whole winter" });

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/shop/product/teak-chair/reviews",
            Some(review.clone()),
            &caller,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["verified_purchase"], true);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/shop/product/teak-chair/reviews",
            Some(review.clone()),
            &caller,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/shop/product/teak-table/reviews",
            Some(json!({ "rating": 3, "title": "Fine", "comment": "Wobbles a bit" })),
            &caller,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["verified_purchase"], false);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/shop/product/teak-chair/reviews",
            Some(review),
            &Caller::Session("visitor".into()),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let app = TestApp::new().await;
    app.seed_product("Teak Chair", "CHR-1", dec!(120), 6).await;
    let (customer, _) = app.seed_customer("harsh@example.com").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/shop/product/teak-chair/reviews",
            Some(json!({ "rating": 0, "title": "Bad", "comment": "No" })),
            &Caller::Customer(customer.id),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn helpful_votes_and_average_rating() {
    let app = TestApp::new().await;
    app.seed_product("Teak Chair", "CHR-1", dec!(120), 6).await;

    let mut review_ids = Vec::new();
    for (email, rating) in [("a@example.com", 5), ("b@example.com", 4), ("c@example.com", 4)] {
        let (customer, _) = app.seed_customer(email).await;
        let (_, body) = app
            .call(
                Method::POST,
                "/api/v1/shop/product/teak-chair/reviews",
                Some(json!({ "rating": rating, "title": "Review", "comment": "Comment" })),
                &Caller::Customer(customer.id),
            )
            .await;
        review_ids.push(body["data"]["id"].as_str().expect("review id").to_string());
    }

    for _ in 0..2 {
        let (status, _) = app
            .call(
                Method::POST,
                &format!("/api/v1/reviews/{}/helpful", review_ids[0]),
                None,
                &Caller::Anonymous,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = app
        .call(Method::GET, "/api/v1/shop/product/teak-chair", None, &Caller::Anonymous)
        .await;
    assert_eq!(money(&body["data"]["average_rating"]), dec!(4.33));
    let reviews = body["data"]["reviews"].as_array().expect("reviews");
    assert_eq!(reviews.len(), 3);
    let voted = reviews
        .iter()
        .find(|r| r["id"] == json!(review_ids[0]))
        .expect("voted review");
    assert_eq!(voted["helpful_votes"], 2);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/reviews/{}/helpful", Uuid::new_v4()),
            None,
            &Caller::Anonymous,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wishlists_belong_to_their_owner() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(120), 6).await;
    let (owner, _) = app.seed_customer("owner@example.com").await;
    let (other, _) = app.seed_customer("other@example.com").await;
    let owner = Caller::Customer(owner.id);
    let other = Caller::Customer(other.id);

    let (status, body) = app
        .call(Method::POST, "/api/v1/wishlists", Some(json!({})), &owner)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "My Wishlist");
    let wishlist_id = body["data"]["id"].as_str().expect("wishlist id").to_string();
    let items_uri = format!("/api/v1/wishlists/{}/items", wishlist_id);

    let (status, body) = app
        .call(
            Method::POST,
            &items_uri,
            Some(json!({ "product_id": chair.id, "notes": "for the deck" })),
            &owner,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = body["data"]["id"].as_str().expect("item id").to_string();

    let (status, _) = app
        .call(Method::POST, &items_uri, Some(json!({ "product_id": chair.id })), &owner)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call(Method::POST, &items_uri, Some(json!({ "product_id": chair.id })), &other)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app
        .call(Method::GET, "/api/v1/shop/product/teak-chair", None, &owner)
        .await;
    assert_eq!(body["data"]["in_wishlist"], true);

    let (_, body) = app.call(Method::GET, "/api/v1/wishlists", None, &owner).await;
    assert_eq!(body["data"][0]["items"][0]["slug"], "teak-chair");
    let (_, body) = app.call(Method::GET, "/api/v1/wishlists", None, &other).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

    let item_uri = format!("{}/{}", items_uri, item_id);
    let (status, _) = app.call(Method::DELETE, &item_uri, None, &other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call(Method::DELETE, &item_uri, None, &owner).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call(Method::DELETE, &item_uri, None, &owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn account_page_and_address_book() {
    let app = TestApp::new().await;
    let (customer, _) = app.seed_customer("account@example.com").await;
    let caller = Caller::Customer(customer.id);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/my-account/addresses",
            Some(json!({
                "line1": "9 Lakeside Drive",
                "city": "Madison",
                "state": "WI",
                "postal_code": "53703",
                "country": "US",
                "address_type": "shipping"
            })),
            &caller,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.call(Method::GET, "/api/v1/my-account", None, &caller).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["customer"]["email"], "account@example.com");
    assert_eq!(body["data"]["addresses"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["recent_orders"].as_array().map(Vec::len), Some(0));

    let (status, _) = app
        .call(
            Method::GET,
            "/api/v1/my-account",
            None,
            &Caller::Session("nobody".into()),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn staff_manage_products() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/admin/products",
            Some(json!({
                "name": "Cedar Adirondack Chair",
                "category_id": app.category.id,
                "material_id": app.material.id,
                "price": "249.99",
                "sku": "ADK-1"
            })),
            &Caller::Anonymous,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["slug"], "cedar-adirondack-chair");
    let id = body["data"]["id"].as_str().expect("product id").to_string();

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/admin/products",
            Some(json!({
                "name": "Another Chair",
                "category_id": app.category.id,
                "material_id": app.material.id,
                "price": "99",
                "sku": "ADK-1"
            })),
            &Caller::Anonymous,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/admin/products/{}", id),
            Some(json!({ "sale_price": "300" })),
            &Caller::Anonymous,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/admin/products/{}/images", id),
            Some(json!({ "image_url": "https://cdn.example.com/adk.jpg", "is_primary": true })),
            &Caller::Anonymous,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/admin/products/{}/variants", id),
            Some(json!({ "color": "Forest Green", "price_adjustment": "15" })),
            &Caller::Anonymous,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/admin/products/{}", id),
            None,
            &Caller::Anonymous,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["images"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"]["variants"][0]["color"], "Forest Green");

    let (_, body) = app
        .call(Method::GET, "/api/v1/admin/products?q=adirondack", None, &Caller::Anonymous)
        .await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, body) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/admin/products/{}", id),
            None,
            &Caller::Anonymous,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    // still visible to staff, gone from the shop
    let (_, body) = app
        .call(Method::GET, "/api/v1/admin/products", None, &Caller::Anonymous)
        .await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    let (_, body) = shop(&app, "").await;
    assert_eq!(body["data"]["products"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn staff_customer_pages() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(100), 6).await;
    let (customer, address) = app.seed_customer("regular@example.com").await;
    app.seed_customer("someone@example.com").await;
    buy(&app, &Caller::Customer(customer.id), address, chair.id).await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/admin/customers",
            Some(json!({
                "email": "REGULAR@example.com",
                "first_name": "Dup",
                "last_name": "Licate"
            })),
            &Caller::Anonymous,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app
        .call(Method::GET, "/api/v1/admin/customers?q=regular", None, &Caller::Anonymous)
        .await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/admin/customers/{}", customer.id),
            None,
            &Caller::Anonymous,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order_count"], 1);
    // 100 + 7 tax + 10 standard shipping
    assert_eq!(money(&body["data"]["total_spent"]), dec!(117));
}

#[tokio::test]
async fn dashboard_summarises_the_store() {
    let app = TestApp::new().await;
    app.seed_product("Teak Chair", "CHR-1", dec!(100), 40).await;
    app.seed_product("Teak Table", "TBL-1", dec!(400), 1).await;

    let (status, body) = app
        .call(Method::GET, "/api/v1/admin/dashboard", None, &Caller::Anonymous)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_products"], 2);
    assert_eq!(body["data"]["total_orders"], 0);
    let low = body["data"]["low_stock_items"].as_array().expect("low stock");
    assert_eq!(low.len(), 1);
    assert_eq!(low[0]["sku"], "TBL-1");
}

#[tokio::test]
async fn promotions_are_managed_by_staff() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/admin/promotions",
            Some(json!({
                "name": "Spring",
                "discount_type": "percentage",
                "discount_value": "15",
                "code": "spring15",
                "start_date": "2020-01-01T00:00:00Z",
                "end_date": "2099-01-01T00:00:00Z"
            })),
            &Caller::Anonymous,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["code"], "SPRING15");

    let (_, body) = app
        .call(Method::GET, "/api/v1/admin/promotions", None, &Caller::Anonymous)
        .await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn health_endpoints() {
    let app = TestApp::new().await;

    let (status, body) = app.call(Method::GET, "/health", None, &Caller::Anonymous).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"]["status"], "up");

    let (status, _) = app
        .call(Method::GET, "/health/live", None, &Caller::Anonymous)
        .await;
    assert_eq!(status, StatusCode::OK);
}
