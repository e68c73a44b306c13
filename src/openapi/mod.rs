use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Backyard Furniture API",
        version = "1.0.0",
        description = r#"
# Backyard Furniture Store API

Storefront and back office for an outdoor furniture shop.

## Callers

Storefront endpoints identify the caller with one of two headers set by the
fronting layer:

- `X-Customer-Id`: the authenticated customer's id
- `X-Session-Key`: an anonymous visitor's session

Carts work with either; checkout, account pages, reviews and wishlists need
a customer.

## Error Handling

Failures share one body shape:

```json
{
  "error": "Bad Request",
  "message": "Your cart is empty.",
  "request_id": "0b6f3c1e-6a8e-4a7b-9c52-2f1f0e4c9a11",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "storefront", description = "Catalog browsing"),
        (name = "cart", description = "Shopping cart"),
        (name = "checkout", description = "Order placement"),
        (name = "account", description = "Customer account pages"),
        (name = "inventory", description = "Staff stock management"),
        (name = "orders", description = "Staff order fulfilment")
    ),
    paths(
        // Storefront
        crate::handlers::commerce::shop::home,
        crate::handlers::commerce::shop::shop,
        crate::handlers::commerce::shop::product_detail,
        // Cart
        crate::handlers::commerce::carts::get_cart,
        crate::handlers::commerce::carts::add_to_cart,
        crate::handlers::commerce::carts::update_cart_item,
        crate::handlers::commerce::carts::remove_cart_item,
        crate::handlers::commerce::carts::clear_cart,
        // Checkout
        crate::handlers::commerce::checkout::checkout,
        crate::handlers::commerce::checkout::order_confirmation,
        // Account
        crate::handlers::commerce::account::my_account,
        crate::handlers::commerce::account::my_orders,
        // Staff
        crate::handlers::inventory::adjust_inventory,
        crate::handlers::orders::update_order,
        crate::handlers::orders::update_order_status,
    ),
    components(
        schemas(
            // Cart types
            crate::services::commerce::cart_service::AddToCartInput,
            crate::services::commerce::cart_service::UpdateCartItemInput,
            crate::services::commerce::cart_service::CartLine,
            crate::services::commerce::cart_service::CartView,
            crate::handlers::commerce::carts::AddToCartResponse,
            crate::services::commerce::pricing_service::OrderTotals,
            crate::services::promotions::AppliedPromotionView,
            // Checkout and order types
            crate::services::commerce::checkout_service::CheckoutInput,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderItemResponse,
            crate::services::orders::UpdateOrderRequest,
            crate::services::orders::UpdateOrderStatusRequest,
            crate::entities::OrderStatus,
            crate::entities::PaymentStatus,
            crate::entities::PaymentMethod,
            crate::entities::ShippingMethod,
            // Inventory types
            crate::services::inventory::AdjustInventoryInput,
            crate::services::inventory::AdjustmentAction,
            // Error types
            crate::errors::ErrorResponse,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_covers_storefront_and_checkout() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Backyard Furniture API"));
        assert!(json.contains("/api/v1/checkout"));
        assert!(json.contains("/api/v1/cart/add/{product_id}"));
        assert!(json.contains("CartView"));
    }
}
