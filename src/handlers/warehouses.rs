use crate::handlers::common::{created_response, success_response};
use crate::{errors::ServiceError, services::inventory::CreateWarehouseInput, AppState};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::get,
    Router,
};

pub fn warehouses_routes() -> Router<AppState> {
    Router::new().route("/warehouses", get(list_warehouses).post(create_warehouse))
}

async fn list_warehouses(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let warehouses = state.services.inventory.list_warehouses().await?;
    Ok(success_response(warehouses))
}

async fn create_warehouse(
    State(state): State<AppState>,
    Json(payload): Json<CreateWarehouseInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouse = state.services.inventory.create_warehouse(payload).await?;
    Ok(created_response(warehouse))
}
