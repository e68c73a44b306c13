//! Integration tests for the storefront cart.
//!
//! Tests cover:
//! - Session and customer carts
//! - Adding/updating/removing items and clearing
//! - Stock checks at add-to-cart time
//! - Read-time pricing and promotion display

mod common;

use axum::http::{Method, StatusCode};
use backyard_api::entities::commerce::DiscountType;
use common::{money, Caller, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

fn visitor() -> Caller {
    Caller::Session("visitor-abc".to_string())
}

#[tokio::test]
async fn anonymous_visitor_gets_a_session_cart() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(120), 10).await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/cart/add/{}", chair.id),
            Some(json!({ "quantity": 2 })),
            &visitor(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let lines = body["cart"]["lines"].as_array().expect("cart lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 2);
    assert_eq!(body["cart"]["item_count"], 2);
    assert_eq!(money(&body["cart"]["subtotal"]), dec!(240));

    let (status, body) = app.call(Method::GET, "/api/v1/cart", None, &visitor()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["success"].as_bool().unwrap_or(false));
    assert_eq!(body["data"]["lines"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn carts_are_not_shared_between_sessions() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(120), 10).await;

    app.call(
        Method::POST,
        &format!("/api/v1/cart/add/{}", chair.id),
        Some(json!({ "quantity": 1 })),
        &visitor(),
    )
    .await;

    let (_, body) = app
        .call(
            Method::GET,
            "/api/v1/cart",
            None,
            &Caller::Session("someone-else".into()),
        )
        .await;
    assert_eq!(body["data"]["lines"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn adding_the_same_product_merges_lines() {
    let app = TestApp::new().await;
    let (customer, _) = app.seed_customer("merge@example.com").await;
    let caller = Caller::Customer(customer.id);
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(120), 10).await;
    let uri = format!("/api/v1/cart/add/{}", chair.id);

    app.call(Method::POST, &uri, Some(json!({ "quantity": 1 })), &caller).await;
    let (status, body) = app
        .call(Method::POST, &uri, Some(json!({ "quantity": 2 })), &caller)
        .await;

    assert_eq!(status, StatusCode::OK);
    let lines = body["cart"]["lines"].as_array().expect("cart lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 3);
}

#[tokio::test]
async fn quantity_above_stock_is_rejected_without_touching_the_cart() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(120), 3).await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/cart/add/{}", chair.id),
            Some(json!({ "quantity": 5 })),
            &visitor(),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Sorry, only 3 items available.");

    let (_, body) = app.call(Method::GET, "/api/v1/cart", None, &visitor()).await;
    assert_eq!(body["data"]["lines"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn stock_check_counts_what_is_already_in_the_cart() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(120), 5).await;
    let uri = format!("/api/v1/cart/add/{}", chair.id);

    let (status, _) = app
        .call(Method::POST, &uri, Some(json!({ "quantity": 3 })), &visitor())
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(Method::POST, &uri, Some(json!({ "quantity": 3 })), &visitor())
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = app.call(Method::GET, "/api/v1/cart", None, &visitor()).await;
    assert_eq!(body["data"]["lines"][0]["quantity"], 3);
}

#[tokio::test]
async fn inactive_products_cannot_be_added() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(120), 5).await;
    app.call(
        Method::DELETE,
        &format!("/api/v1/admin/products/{}", chair.id),
        None,
        &Caller::Anonymous,
    )
    .await;

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/cart/add/{}", chair.id),
            Some(json!({ "quantity": 1 })),
            &visitor(),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn zero_quantity_removes_the_line() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(120), 5).await;
    let table = app.seed_product("Teak Table", "TBL-1", dec!(450), 5).await;

    app.call(
        Method::POST,
        &format!("/api/v1/cart/add/{}", chair.id),
        Some(json!({ "quantity": 2 })),
        &visitor(),
    )
    .await;
    let (_, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/cart/add/{}", table.id),
            Some(json!({ "quantity": 1 })),
            &visitor(),
        )
        .await;
    let chair_line = body["cart"]["lines"]
        .as_array()
        .and_then(|lines| lines.iter().find(|l| l["sku"] == "CHR-1"))
        .expect("chair line")["item_id"]
        .as_str()
        .expect("item id")
        .to_string();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/v1/cart/items/{}", chair_line),
            Some(json!({ "quantity": 0 })),
            &visitor(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let lines = body["data"]["lines"].as_array().expect("cart lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["sku"], "TBL-1");
}

#[tokio::test]
async fn update_above_stock_is_rejected() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(120), 4).await;
    let (_, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/cart/add/{}", chair.id),
            Some(json!({ "quantity": 1 })),
            &visitor(),
        )
        .await;
    let item_id = body["cart"]["lines"][0]["item_id"].as_str().expect("item id").to_string();

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/cart/items/{}", item_id),
            Some(json!({ "quantity": 9 })),
            &visitor(),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn remove_and_clear() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(120), 5).await;
    let table = app.seed_product("Teak Table", "TBL-1", dec!(450), 5).await;

    for product in [&chair, &table] {
        app.call(
            Method::POST,
            &format!("/api/v1/cart/add/{}", product.id),
            Some(json!({ "quantity": 1 })),
            &visitor(),
        )
        .await;
    }
    let (_, body) = app.call(Method::GET, "/api/v1/cart", None, &visitor()).await;
    let first = body["data"]["lines"][0]["item_id"].as_str().expect("item id").to_string();

    let (status, body) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/cart/items/{}", first),
            None,
            &visitor(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lines"].as_array().map(Vec::len), Some(1));

    let (status, body) = app.call(Method::DELETE, "/api/v1/cart", None, &visitor()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lines"].as_array().map(Vec::len), Some(0));
    assert_eq!(money(&body["data"]["total"]), Decimal::ZERO);
}

#[tokio::test]
async fn lines_of_another_cart_are_not_found() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(120), 5).await;
    let (_, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/cart/add/{}", chair.id),
            Some(json!({ "quantity": 1 })),
            &visitor(),
        )
        .await;
    let item_id = body["cart"]["lines"][0]["item_id"].as_str().expect("item id").to_string();

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/cart/items/{}", item_id),
            None,
            &Caller::Session("intruder".into()),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cart_requires_a_caller() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(Method::GET, "/api/v1/cart", None, &Caller::Anonymous)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn cart_is_priced_at_read_time() {
    let app = TestApp::new().await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(100), 5).await;
    app.call(
        Method::POST,
        &format!("/api/v1/cart/add/{}", chair.id),
        Some(json!({ "quantity": 2 })),
        &visitor(),
    )
    .await;

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/admin/products/{}", chair.id),
            Some(json!({ "sale_price": "80" })),
            &Caller::Anonymous,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.call(Method::GET, "/api/v1/cart", None, &visitor()).await;
    let cart = &body["data"];
    assert_eq!(money(&cart["lines"][0]["unit_price"]), dec!(80));
    assert_eq!(money(&cart["subtotal"]), dec!(160));

    let line_sum: Decimal = cart["lines"]
        .as_array()
        .expect("cart lines")
        .iter()
        .map(|l| money(&l["line_total"]))
        .sum();
    assert_eq!(line_sum, money(&cart["subtotal"]));
}

#[tokio::test]
async fn cart_shows_the_best_promotion_and_shipping() {
    let app = TestApp::new().await;
    app.seed_promotion("Ten percent", DiscountType::Percentage, dec!(10), dec!(100), None, None)
        .await;
    app.seed_promotion("Flat fifteen", DiscountType::Fixed, dec!(15), dec!(50), None, None)
        .await;
    let chair = app.seed_product("Teak Chair", "CHR-1", dec!(100), 5).await;

    app.call(
        Method::POST,
        &format!("/api/v1/cart/add/{}", chair.id),
        Some(json!({ "quantity": 2 })),
        &visitor(),
    )
    .await;

    let (_, body) = app
        .call(
            Method::GET,
            "/api/v1/cart?shipping_method=express",
            None,
            &visitor(),
        )
        .await;
    let cart = &body["data"];
    assert_eq!(cart["promotion"]["name"], "Ten percent");
    assert_eq!(money(&cart["discount"]), dec!(20));
    assert_eq!(money(&cart["shipping"]), dec!(25));
    assert_eq!(money(&cart["tax"]), dec!(14));
    assert_eq!(money(&cart["total"]), dec!(219));
}

#[tokio::test]
async fn malformed_customer_header_is_a_bad_request() {
    let app = TestApp::new().await;
    let request = axum::http::Request::builder()
        .uri("/api/v1/cart")
        .header("x-customer-id", "not-a-uuid")
        .body(axum::body::Body::empty())
        .expect("request");
    let response = tower::ServiceExt::oneshot(backyard_api::app_router(app.state.clone()), request)
        .await
        .expect("router response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
