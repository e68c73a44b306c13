use crate::handlers::common::success_response;
use crate::{
    errors::ServiceError,
    services::orders::{OrderFilter, OrderResponse, UpdateOrderRequest, UpdateOrderStatusRequest},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use uuid::Uuid;

/// Creates the router for staff order endpoints
pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(get_order).put(update_order))
        .route("/orders/:id/status", put(update_order_status))
}

/// List orders filtered by status, creation date range or search text
async fn list_orders(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.order.list_orders(filter).await?;
    Ok(success_response(orders))
}

/// Order with its customer and status timeline
async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.order.get_order_detail(id).await?;
    Ok(success_response(detail))
}

/// Update shipping, tracking, notes or payment status
#[utoipa::path(
    put,
    path = "/api/v1/admin/orders/{id}",
    summary = "Update order",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.order.update_order(id, payload).await?;
    Ok(success_response(order))
}

/// Move an order to a new status
#[utoipa::path(
    put,
    path = "/api/v1/admin/orders/{id}/status",
    summary = "Change order status",
    description = "Records a history row when the status actually changes.",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = OrderResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .order
        .update_order_status(id, payload)
        .await?;
    Ok(success_response(order))
}
