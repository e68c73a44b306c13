/// Storefront API handlers module
pub mod account;
pub mod carts;
pub mod checkout;
pub mod reviews;
pub mod shop;
pub mod wishlists;

// Re-export route builders
pub use account::account_routes;
pub use carts::carts_routes;
pub use checkout::checkout_routes;
pub use reviews::reviews_routes;
pub use shop::shop_routes;
pub use wishlists::wishlists_routes;

use axum::Router;

/// Every storefront route, relative to `/api/v1`.
pub fn storefront_routes() -> Router<crate::AppState> {
    Router::new()
        .merge(shop_routes())
        .merge(carts_routes())
        .merge(checkout_routes())
        .merge(account_routes())
        .merge(reviews_routes())
        .merge(wishlists_routes())
}
