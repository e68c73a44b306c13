use crate::handlers::common::{created_response, success_response};
use crate::{
    errors::ServiceError, services::commerce::customer_service::CreateCustomerInput, AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

/// Creates the router for staff customer endpoints
pub fn customers_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/:id", get(get_customer))
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerSearch {
    /// Matches name or email
    pub q: Option<String>,
}

async fn list_customers(
    State(state): State<AppState>,
    Query(search): Query<CustomerSearch>,
) -> Result<impl IntoResponse, ServiceError> {
    let customers = state.services.customer.list_customers(search.q).await?;
    Ok(success_response(customers))
}

async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state.services.customer.create_customer(payload).await?;
    Ok(created_response(customer))
}

/// Customer with orders, reviews, addresses and spend statistics
async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.customer.customer_detail(id).await?;
    Ok(success_response(detail))
}
