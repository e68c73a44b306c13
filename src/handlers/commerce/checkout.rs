use crate::handlers::common::{created_response, success_response, CallerIdentity};
use crate::{
    errors::ServiceError,
    services::{commerce::checkout_service::CheckoutInput, orders::OrderResponse},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

/// Creates the router for checkout endpoints
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/order-confirmation/:order_id", get(order_confirmation))
}

/// Place an order from the customer's cart
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    summary = "Checkout",
    description = "Turns the customer's cart into an order. Stock is taken, prices are pinned, the best promotion is applied and the cart is emptied in one transaction.",
    params(("X-Customer-Id" = String, Header, description = "Authenticated customer")),
    request_body = CheckoutInput,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Empty cart or missing fields", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer profile not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough stock", body = crate::errors::ErrorResponse)
    ),
    tag = "checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(payload): Json<CheckoutInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .checkout
        .place_order(caller.customer_id, payload)
        .await?;
    Ok(created_response(order))
}

/// Order confirmation for the customer who placed it
#[utoipa::path(
    get,
    path = "/api/v1/order-confirmation/{order_id}",
    summary = "Order confirmation",
    params(
        ("X-Customer-Id" = String, Header, description = "Authenticated customer"),
        ("order_id" = Uuid, Path, description = "Order id")
    ),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "checkout"
)]
pub async fn order_confirmation(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state
        .services
        .customer
        .require_customer(caller.customer_id)
        .await?;
    let order = state
        .services
        .order
        .get_customer_order(customer.id, order_id)
        .await?;
    Ok(success_response(order))
}
