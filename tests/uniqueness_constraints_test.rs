//! Storage-level uniqueness for carts, cart lines and wishlist items.
//!
//! Rows are written straight through the entities, bypassing the services'
//! own duplicate checks, so only the schema stands in the way.

mod common;

use axum::http::{Method, StatusCode};
use backyard_api::{
    entities::commerce::{cart, cart_item, wishlist_item, Cart},
    errors::is_unique_violation,
    services::commerce::{
        cart_service::CartOwner, product_catalog_service::AddVariantInput,
        wishlist_service::CreateWishlistInput,
    },
};
use chrono::Utc;
use common::{Caller, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde_json::json;
use uuid::Uuid;

fn new_cart(customer_id: Option<Uuid>, session_key: Option<&str>) -> cart::ActiveModel {
    let now = Utc::now();
    cart::ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer_id),
        session_key: Set(session_key.map(str::to_string)),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

fn new_line(cart_id: Uuid, product_id: Uuid, variant_id: Option<Uuid>) -> cart_item::ActiveModel {
    let now = Utc::now();
    cart_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart_id),
        product_id: Set(product_id),
        variant_id: Set(variant_id),
        quantity: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

fn new_wish(wishlist_id: Uuid, product_id: Uuid, variant_id: Option<Uuid>) -> wishlist_item::ActiveModel {
    wishlist_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        wishlist_id: Set(wishlist_id),
        product_id: Set(product_id),
        variant_id: Set(variant_id),
        notes: Set(String::new()),
        added_at: Set(Utc::now()),
    }
}

fn assert_unique_violation<T: std::fmt::Debug>(result: Result<T, DbErr>) {
    match result {
        Err(err) => assert!(is_unique_violation(&err), "unexpected error: {err:?}"),
        Ok(row) => panic!("duplicate row was stored: {row:?}"),
    }
}

#[tokio::test]
async fn a_customer_has_at_most_one_cart() {
    let app = TestApp::new().await;
    let db = app.state.db.as_ref();
    let (customer, _) = app.seed_customer("one-cart@example.com").await;

    new_cart(Some(customer.id), None)
        .insert(db)
        .await
        .expect("first cart");
    assert_unique_violation(new_cart(Some(customer.id), None).insert(db).await);

    let carts = Cart::find()
        .filter(cart::Column::CustomerId.eq(customer.id))
        .all(db)
        .await
        .expect("carts");
    assert_eq!(carts.len(), 1);
}

#[tokio::test]
async fn an_anonymous_session_has_at_most_one_cart() {
    let app = TestApp::new().await;
    let db = app.state.db.as_ref();
    let (customer, _) = app.seed_customer("adopted@example.com").await;

    new_cart(None, Some("visitor-1"))
        .insert(db)
        .await
        .expect("session cart");
    assert_unique_violation(new_cart(None, Some("visitor-1")).insert(db).await);

    // the key only has to be unique among anonymous carts
    new_cart(Some(customer.id), Some("visitor-1"))
        .insert(db)
        .await
        .expect("customer cart sharing the key");
    new_cart(None, Some("visitor-2"))
        .insert(db)
        .await
        .expect("other session");
}

#[tokio::test]
async fn a_cart_holds_one_line_per_product_and_variant() {
    let app = TestApp::new().await;
    let db = app.state.db.as_ref();
    let product = app.seed_product("Patio Umbrella", "UMB-1", dec!(120), 10).await;
    let catalog = &app.state.services.product_catalog;
    let mut variants = Vec::new();
    for color in ["Sand", "Navy"] {
        variants.push(
            catalog
                .add_variant(
                    product.id,
                    AddVariantInput {
                        color: color.to_string(),
                        color_code: None,
                        price_adjustment: None,
                    },
                )
                .await
                .expect("variant"),
        );
    }

    let cart = new_cart(None, Some("lines")).insert(db).await.expect("cart");

    new_line(cart.id, product.id, None).insert(db).await.expect("plain line");
    assert_unique_violation(new_line(cart.id, product.id, None).insert(db).await);

    new_line(cart.id, product.id, Some(variants[0].id))
        .insert(db)
        .await
        .expect("sand line");
    new_line(cart.id, product.id, Some(variants[1].id))
        .insert(db)
        .await
        .expect("navy line");
    assert_unique_violation(
        new_line(cart.id, product.id, Some(variants[0].id))
            .insert(db)
            .await,
    );
}

#[tokio::test]
async fn a_wishlist_holds_each_product_once() {
    let app = TestApp::new().await;
    let db = app.state.db.as_ref();
    let (customer, _) = app.seed_customer("wish@example.com").await;
    let product = app.seed_product("Hammock", "HAM-1", dec!(90), 3).await;
    let wishlist = app
        .state
        .services
        .wishlists
        .create_wishlist(customer.id, CreateWishlistInput::default())
        .await
        .expect("wishlist")
        .wishlist;

    new_wish(wishlist.id, product.id, None)
        .insert(db)
        .await
        .expect("first entry");
    assert_unique_violation(new_wish(wishlist.id, product.id, None).insert(db).await);
}

#[tokio::test]
async fn cart_creation_reuses_a_cart_stored_alongside() {
    let app = TestApp::new().await;
    let db = app.state.db.as_ref();
    let (customer, _) = app.seed_customer("reuse@example.com").await;
    let product = app.seed_product("Fire Pit", "PIT-1", dec!(300), 5).await;

    let existing = new_cart(Some(customer.id), None)
        .insert(db)
        .await
        .expect("cart stored first");

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/cart/add/{}", product.id),
            Some(json!({ "quantity": 2 })),
            &Caller::Customer(customer.id),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["cart_id"], existing.id.to_string());

    let found = app
        .state
        .services
        .cart
        .find_cart(db, &CartOwner::Customer(customer.id))
        .await
        .expect("lookup")
        .expect("cart");
    assert_eq!(found.id, existing.id);
}
