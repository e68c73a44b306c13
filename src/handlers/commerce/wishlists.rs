use crate::handlers::common::{
    created_response, no_content_response, success_response, CallerIdentity,
};
use crate::{
    errors::ServiceError,
    services::commerce::wishlist_service::{AddWishlistItemInput, CreateWishlistInput},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use uuid::Uuid;

/// Creates the router for wishlist endpoints
pub fn wishlists_routes() -> Router<AppState> {
    Router::new()
        .route("/wishlists", get(list_wishlists).post(create_wishlist))
        .route("/wishlists/:id/items", post(add_wishlist_item))
        .route("/wishlists/:id/items/:item_id", delete(remove_wishlist_item))
}

async fn list_wishlists(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state
        .services
        .customer
        .require_customer(caller.customer_id)
        .await?;
    let wishlists = state.services.wishlists.list_wishlists(customer.id).await?;
    Ok(success_response(wishlists))
}

async fn create_wishlist(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(payload): Json<CreateWishlistInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state
        .services
        .customer
        .require_customer(caller.customer_id)
        .await?;
    let wishlist = state
        .services
        .wishlists
        .create_wishlist(customer.id, payload)
        .await?;
    Ok(created_response(wishlist))
}

async fn add_wishlist_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(wishlist_id): Path<Uuid>,
    Json(payload): Json<AddWishlistItemInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state
        .services
        .customer
        .require_customer(caller.customer_id)
        .await?;
    let item = state
        .services
        .wishlists
        .add_item(customer.id, wishlist_id, payload)
        .await?;
    Ok(created_response(item))
}

async fn remove_wishlist_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path((wishlist_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state
        .services
        .customer
        .require_customer(caller.customer_id)
        .await?;
    state
        .services
        .wishlists
        .remove_item(customer.id, wishlist_id, item_id)
        .await?;
    Ok(no_content_response())
}
