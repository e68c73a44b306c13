use crate::handlers::common::{created_response, success_response};
use crate::{errors::ServiceError, services::promotions::CreatePromotionInput, AppState};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::get,
    Router,
};

pub fn promotions_routes() -> Router<AppState> {
    Router::new().route("/promotions", get(list_promotions).post(create_promotion))
}

/// All promotions in the order checkout evaluates them
async fn list_promotions(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let promotions = state.services.promotions.list_promotions().await?;
    Ok(success_response(promotions))
}

async fn create_promotion(
    State(state): State<AppState>,
    Json(payload): Json<CreatePromotionInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let promotion = state.services.promotions.create_promotion(payload).await?;
    Ok(created_response(promotion))
}
