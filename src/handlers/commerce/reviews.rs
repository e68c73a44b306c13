use crate::handlers::common::{created_response, success_response, CallerIdentity};
use crate::{
    errors::ServiceError, services::commerce::review_service::CreateReviewInput, AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use uuid::Uuid;

/// Creates the router for product review endpoints
pub fn reviews_routes() -> Router<AppState> {
    Router::new()
        .route("/shop/product/:slug/reviews", post(create_review))
        .route("/reviews/:id/helpful", post(mark_helpful))
}

/// Post a review; one per customer per product
async fn create_review(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(slug): Path<String>,
    Json(payload): Json<CreateReviewInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state
        .services
        .reviews
        .create_review(caller.customer_id, &slug, payload)
        .await?;
    Ok(created_response(review))
}

async fn mark_helpful(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state.services.reviews.mark_helpful(id).await?;
    Ok(success_response(review))
}
