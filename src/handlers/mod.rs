pub mod common;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod warehouses;

pub mod commerce;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    commerce::{
        CartService, CheckoutService, CustomerService, PricingPolicy, ProductCatalogService,
        ReviewService, WishlistService,
    },
    dashboard::DashboardService,
    inventory::InventoryService,
    orders::OrderService,
    promotions::PromotionService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub product_catalog: Arc<ProductCatalogService>,
    pub cart: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub customer: Arc<CustomerService>,
    pub order: Arc<OrderService>,
    pub inventory: Arc<InventoryService>,
    pub promotions: Arc<PromotionService>,
    pub reviews: Arc<ReviewService>,
    pub wishlists: Arc<WishlistService>,
    pub dashboard: Arc<DashboardService>,
}

impl AppServices {
    /// Wires every service against one connection pool and event channel.
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, pricing: PricingPolicy) -> Self {
        let inventory = InventoryService::new(db_pool.clone(), event_sender.clone());
        let promotions = PromotionService::new(db_pool.clone());
        let wishlists = WishlistService::new(db_pool.clone());
        let order = OrderService::new(db_pool.clone(), event_sender.clone());

        let cart = CartService::new(
            db_pool.clone(),
            event_sender.clone(),
            inventory.clone(),
            promotions.clone(),
            pricing,
        );
        let checkout = CheckoutService::new(
            db_pool.clone(),
            event_sender.clone(),
            cart.clone(),
            inventory.clone(),
            promotions.clone(),
            pricing,
        );
        let product_catalog = ProductCatalogService::new(
            db_pool.clone(),
            event_sender.clone(),
            inventory.clone(),
            promotions.clone(),
            wishlists.clone(),
        );
        let customer = CustomerService::new(
            db_pool.clone(),
            event_sender.clone(),
            order.clone(),
            wishlists.clone(),
        );
        let reviews = ReviewService::new(db_pool.clone(), event_sender);
        let dashboard = DashboardService::new(db_pool, inventory.clone());

        Self {
            product_catalog: Arc::new(product_catalog),
            cart: Arc::new(cart),
            checkout: Arc::new(checkout),
            customer: Arc::new(customer),
            order: Arc::new(order),
            inventory: Arc::new(inventory),
            promotions: Arc::new(promotions),
            reviews: Arc::new(reviews),
            wishlists: Arc::new(wishlists),
            dashboard: Arc::new(dashboard),
        }
    }
}
