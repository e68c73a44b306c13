use crate::handlers::common::{success_response, CallerIdentity};
use crate::{
    entities::ShippingMethod,
    errors::ServiceError,
    services::commerce::cart_service::{AddToCartInput, CartView, UpdateCartItemInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Creates the router for cart endpoints
pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/add/:product_id", post(add_to_cart))
        .route(
            "/cart/items/:item_id",
            delete(remove_cart_item).put(update_cart_item),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct CartQuery {
    /// Prices shipping into the totals when set
    pub shipping_method: Option<ShippingMethod>,
}

/// Body returned by add-to-cart
#[derive(Debug, Serialize, ToSchema)]
pub struct AddToCartResponse {
    pub status: String,
    pub cart: CartView,
}

/// Get the caller's cart
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    summary = "View cart",
    description = "The caller's cart priced at current catalog prices, with the best promotion applied.",
    params(
        ("X-Customer-Id" = Option<String>, Header, description = "Authenticated customer"),
        ("X-Session-Key" = Option<String>, Header, description = "Anonymous visitor session"),
        ("shipping_method" = Option<ShippingMethod>, Query, description = "Shipping method to price")
    ),
    responses(
        (status = 200, description = "Cart", body = CartView),
        (status = 401, description = "No customer or session", body = crate::errors::ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<CartQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let owner = caller.cart_owner()?;
    let cart = state
        .services
        .cart
        .view_cart(&owner, query.shipping_method)
        .await?;
    Ok(success_response(cart))
}

/// Add a product to the cart
#[utoipa::path(
    post,
    path = "/api/v1/cart/add/{product_id}",
    summary = "Add to cart",
    description = "Adds the product, merging with an existing line. Rejected when stock cannot cover the new cart quantity.",
    params(("product_id" = Uuid, Path, description = "Product to add")),
    request_body = AddToCartInput,
    responses(
        (status = 200, description = "Updated cart", body = AddToCartResponse),
        (status = 400, description = "Invalid quantity or variant", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough stock", body = crate::errors::ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<AddToCartInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let owner = caller.cart_owner()?;
    let cart = state
        .services
        .cart
        .add_item(&owner, product_id, payload)
        .await?;
    Ok(Json(AddToCartResponse {
        status: "success".to_string(),
        cart,
    }))
}

/// Update cart item quantity
#[utoipa::path(
    put,
    path = "/api/v1/cart/items/{item_id}",
    summary = "Change quantity",
    description = "Sets a line's quantity; 0 removes the line.",
    params(("item_id" = Uuid, Path, description = "Cart line")),
    request_body = UpdateCartItemInput,
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 404, description = "Line not in this cart", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough stock", body = crate::errors::ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let owner = caller.cart_owner()?;
    let cart = state
        .services
        .cart
        .update_item(&owner, item_id, payload)
        .await?;
    Ok(success_response(cart))
}

/// Remove item from cart
#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{item_id}",
    summary = "Remove line",
    params(("item_id" = Uuid, Path, description = "Cart line")),
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 404, description = "Line not in this cart", body = crate::errors::ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let owner = caller.cart_owner()?;
    let cart = state.services.cart.remove_item(&owner, item_id).await?;
    Ok(success_response(cart))
}

/// Empty the cart
#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    summary = "Clear cart",
    responses(
        (status = 200, description = "Empty cart", body = CartView),
        (status = 401, description = "No customer or session", body = crate::errors::ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<impl IntoResponse, ServiceError> {
    let owner = caller.cart_owner()?;
    let cart = state.services.cart.clear_cart(&owner).await?;
    Ok(success_response(cart))
}
