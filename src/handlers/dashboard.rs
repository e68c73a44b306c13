use crate::handlers::common::success_response;
use crate::{errors::ServiceError, AppState};
use axum::{extract::State, response::IntoResponse, routing::get, Router};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

/// Catalog and order counts, the latest products and orders, and low stock
async fn dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.services.dashboard.summary().await?;
    Ok(success_response(summary))
}
