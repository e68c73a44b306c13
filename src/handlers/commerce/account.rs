use crate::handlers::common::{created_response, success_response, CallerIdentity};
use crate::{
    errors::ServiceError, services::commerce::customer_service::AddAddressInput, AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};

/// Creates the router for the customer's own account pages
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/my-account", get(my_account))
        .route("/my-account/addresses", post(add_address))
        .route("/my-orders", get(my_orders))
}

/// Account overview
#[utoipa::path(
    get,
    path = "/api/v1/my-account",
    summary = "My account",
    description = "Profile, recent orders, address book and wishlists.",
    params(("X-Customer-Id" = String, Header, description = "Authenticated customer")),
    responses(
        (status = 200, description = "Account overview"),
        (status = 404, description = "Customer profile not found", body = crate::errors::ErrorResponse)
    ),
    tag = "account"
)]
pub async fn my_account(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<impl IntoResponse, ServiceError> {
    let overview = state
        .services
        .customer
        .account_overview(caller.customer_id)
        .await?;
    Ok(success_response(overview))
}

/// Every order the customer placed, newest first
#[utoipa::path(
    get,
    path = "/api/v1/my-orders",
    summary = "My orders",
    params(("X-Customer-Id" = String, Header, description = "Authenticated customer")),
    responses(
        (status = 200, description = "Orders"),
        (status = 404, description = "Customer profile not found", body = crate::errors::ErrorResponse)
    ),
    tag = "account"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state
        .services
        .customer
        .require_customer(caller.customer_id)
        .await?;
    let orders = state
        .services
        .order
        .list_customer_orders(customer.id, None)
        .await?;
    Ok(success_response(orders))
}

/// Add an address to the address book
pub async fn add_address(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(payload): Json<AddAddressInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state
        .services
        .customer
        .require_customer(caller.customer_id)
        .await?;
    let address = state
        .services
        .customer
        .add_address(customer.id, payload)
        .await?;
    Ok(created_response(address))
}
