use crate::handlers::common::{created_response, success_response};
use crate::{
    errors::ServiceError,
    services::inventory::{AdjustInventoryInput, CreateInventoryInput, InventoryFilter},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

/// Creates the router for inventory endpoints
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_inventory).post(create_inventory))
        .route("/inventory/:id", get(get_inventory))
        .route("/inventory/:id/adjust", post(adjust_inventory))
}

/// List stock rows filtered by warehouse, product, stock status or search text
async fn list_inventory(
    State(state): State<AppState>,
    Query(filter): Query<InventoryFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state.services.inventory.list_inventory(filter).await?;
    Ok(success_response(rows))
}

async fn create_inventory(
    State(state): State<AppState>,
    Json(payload): Json<CreateInventoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let row = state.services.inventory.create_inventory(payload).await?;
    Ok(created_response(row))
}

async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let row = state.services.inventory.get_inventory(id).await?;
    Ok(success_response(row))
}

/// Add or remove stock
#[utoipa::path(
    post,
    path = "/api/v1/admin/inventory/{id}/adjust",
    summary = "Adjust stock",
    description = "Adds or removes units. Removing more than is on hand is rejected and nothing changes.",
    params(("id" = Uuid, Path, description = "Inventory row")),
    request_body = AdjustInventoryInput,
    responses(
        (status = 200, description = "Adjusted row"),
        (status = 400, description = "Would go below zero", body = crate::errors::ErrorResponse),
        (status = 404, description = "Inventory row not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustInventoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let row = state
        .services
        .inventory
        .adjust_inventory(id, payload)
        .await?;
    Ok(success_response(row))
}
