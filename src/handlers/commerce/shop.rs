use crate::handlers::common::{success_response, CallerIdentity};
use crate::{
    errors::ServiceError, services::commerce::product_catalog_service::ShopQuery, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

/// Creates the router for catalog browsing endpoints
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/shop", get(shop))
        .route("/shop/product/:slug", get(product_detail))
}

/// Home page feed
#[utoipa::path(
    get,
    path = "/api/v1/",
    summary = "Home feed",
    description = "Featured products, the newest arrivals and the promotions running now.",
    responses(
        (status = 200, description = "Home feed"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "storefront"
)]
pub async fn home(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let feed = state.services.product_catalog.home_feed().await?;
    Ok(success_response(feed))
}

/// Shop listing with filters
#[utoipa::path(
    get,
    path = "/api/v1/shop",
    summary = "Browse the shop",
    description = "Active products filtered by category, material and price range, plus the filter choices.",
    params(
        ("category" = Option<String>, Query, description = "Category slug"),
        ("material" = Option<uuid::Uuid>, Query, description = "Material id"),
        ("min_price" = Option<String>, Query, description = "Lowest regular price"),
        ("max_price" = Option<String>, Query, description = "Highest regular price"),
        ("sort" = Option<String>, Query, description = "price_low, price_high, newest, popular, rating or name")
    ),
    responses(
        (status = 200, description = "Matching products"),
        (status = 404, description = "Unknown category", body = crate::errors::ErrorResponse)
    ),
    tag = "storefront"
)]
pub async fn shop(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let listing = state.services.product_catalog.shop(query).await?;
    Ok(success_response(listing))
}

/// Product page
#[utoipa::path(
    get,
    path = "/api/v1/shop/product/{slug}",
    summary = "Product page",
    description = "Product with images, variants, stock per warehouse, reviews and related products.",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product detail"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "storefront"
)]
pub async fn product_detail(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .product_catalog
        .product_detail(&slug, caller.customer_id)
        .await?;
    Ok(success_response(detail))
}
