use crate::{
    entities::{Order, OrderModel, Product, ProductModel},
    errors::ServiceError,
    services::{
        inventory::{InventoryService, InventoryView},
        orders::sort_newest_first,
    },
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_products: u64,
    pub total_orders: u64,
    pub recent_products: Vec<ProductModel>,
    pub recent_orders: Vec<OrderModel>,
    pub low_stock_items: Vec<InventoryView>,
}

/// Back-office landing page figures
#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DatabaseConnection>,
    inventory: InventoryService,
}

impl DashboardService {
    pub fn new(db: Arc<DatabaseConnection>, inventory: InventoryService) -> Self {
        Self { db, inventory }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<DashboardSummary, ServiceError> {
        let total_products = Product::find().count(&*self.db).await?;
        let total_orders = Order::find().count(&*self.db).await?;

        let mut recent_products = Product::find().all(&*self.db).await?;
        recent_products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.name.cmp(&b.name)));
        recent_products.truncate(RECENT_LIMIT);

        let mut recent_orders = Order::find().all(&*self.db).await?;
        sort_newest_first(&mut recent_orders);
        recent_orders.truncate(RECENT_LIMIT);

        Ok(DashboardSummary {
            total_products,
            total_orders,
            recent_products,
            recent_orders,
            low_stock_items: self.inventory.low_stock_report().await?,
        })
    }
}
