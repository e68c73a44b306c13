use crate::handlers::common::{created_response, success_response};
use crate::{
    errors::ServiceError,
    services::commerce::product_catalog_service::{
        AddImageInput, AddVariantInput, CreateProductInput, ProductQuery, UpdateProductInput,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

/// Creates the router for staff catalog endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(deactivate_product),
        )
        .route("/products/:id/images", post(add_image))
        .route("/products/:id/variants", post(add_variant))
}

/// List products, active or not, with search and filters
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.services.product_catalog.list_products(query).await?;
    Ok(success_response(products))
}

async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.product_catalog.create_product(payload).await?;
    Ok(created_response(product))
}

/// Product with images, variants, stock rows and reviews
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.product_catalog.staff_product_detail(id).await?;
    Ok(success_response(detail))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state
        .services
        .product_catalog
        .update_product(id, payload)
        .await?;
    Ok(success_response(product))
}

/// Products are never removed; delete takes them off the storefront.
async fn deactivate_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.product_catalog.deactivate_product(id).await?;
    Ok(success_response(product))
}

async fn add_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddImageInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let image = state.services.product_catalog.add_image(id, payload).await?;
    Ok(created_response(image))
}

async fn add_variant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddVariantInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let variant = state.services.product_catalog.add_variant(id, payload).await?;
    Ok(created_response(variant))
}
