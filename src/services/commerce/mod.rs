/// Commerce services module - storefront, cart and checkout business logic
pub mod cart_service;
pub mod checkout_service;
pub mod customer_service;
pub mod pricing_service;
pub mod product_catalog_service;
pub mod review_service;
pub mod wishlist_service;

// Re-export services for convenience
pub use cart_service::{AddToCartInput, CartOwner, CartService, CartView};
pub use checkout_service::{CheckoutInput, CheckoutService};
pub use customer_service::CustomerService;
pub use pricing_service::{OrderTotals, PricingPolicy};
pub use product_catalog_service::ProductCatalogService;
pub use review_service::ReviewService;
pub use wishlist_service::WishlistService;
