use crate::{
    entities::{
        inventory::{self, DEFAULT_REORDER_POINT},
        product, warehouse, Inventory, InventoryModel, Product, Warehouse, WarehouseModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Inventory row joined with the product and warehouse it counts
#[derive(Debug, Clone, Serialize)]
pub struct InventoryView {
    #[serde(flatten)]
    pub inventory: InventoryModel,
    pub product_name: String,
    pub sku: String,
    pub warehouse_name: String,
    pub available_quantity: i32,
    pub needs_restock: bool,
}

impl InventoryView {
    fn new(inventory: InventoryModel, product: &product::Model, warehouse: &WarehouseModel) -> Self {
        Self {
            available_quantity: inventory.available_quantity(),
            needs_restock: inventory.needs_restock(),
            product_name: product.name.clone(),
            sku: product.sku.clone(),
            warehouse_name: warehouse.name.clone(),
            inventory,
        }
    }
}

/// Per-warehouse stock shown on the product page
#[derive(Debug, Clone, Serialize)]
pub struct WarehouseStock {
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub quantity: i32,
    pub available_quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// quantity at or below the reorder point
    Low,
    /// nothing on hand
    Out,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryFilter {
    pub warehouse_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub stock_status: Option<StockStatus>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentAction {
    Add,
    Subtract,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct AdjustInventoryInput {
    pub action: AdjustmentAction,
    #[validate(range(min = 0))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateInventoryInput {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(range(min = 0))]
    pub reserved_quantity: Option<i32>,
    #[validate(range(min = 0))]
    pub reorder_point: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateWarehouseInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub address_id: Option<Uuid>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub manager: Option<String>,
    pub is_active: Option<bool>,
}

/// Service for warehouse stock levels
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create_warehouse(
        &self,
        input: CreateWarehouseInput,
    ) -> Result<WarehouseModel, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let warehouse = warehouse::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            address_id: Set(input.address_id),
            phone: Set(input.phone.unwrap_or_default()),
            email: Set(input.email.unwrap_or_default()),
            manager: Set(input.manager.unwrap_or_default()),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!("Created warehouse {}", warehouse.id);
        Ok(warehouse)
    }

    pub async fn list_warehouses(&self) -> Result<Vec<WarehouseModel>, ServiceError> {
        let mut warehouses = Warehouse::find().all(&*self.db).await?;
        warehouses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(warehouses)
    }

    #[instrument(skip(self))]
    pub async fn create_inventory(
        &self,
        input: CreateInventoryInput,
    ) -> Result<InventoryView, ServiceError> {
        input.validate()?;

        let product = Product::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", input.product_id))?;
        let warehouse = Warehouse::find_by_id(input.warehouse_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Warehouse", input.warehouse_id))?;

        let existing = Inventory::find()
            .filter(inventory::Column::ProductId.eq(input.product_id))
            .filter(inventory::Column::WarehouseId.eq(input.warehouse_id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Inventory for {} already exists in {}",
                product.sku, warehouse.name
            )));
        }

        let now = Utc::now();
        let row = inventory::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            warehouse_id: Set(input.warehouse_id),
            quantity: Set(input.quantity),
            reserved_quantity: Set(input.reserved_quantity.unwrap_or(0)),
            reorder_point: Set(input.reorder_point.unwrap_or(DEFAULT_REORDER_POINT)),
            last_restock_date: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(inventory_id = %row.id, sku = %product.sku, "Created inventory row");
        Ok(InventoryView::new(row, &product, &warehouse))
    }

    pub async fn get_inventory(&self, inventory_id: Uuid) -> Result<InventoryView, ServiceError> {
        let row = Inventory::find_by_id(inventory_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory", inventory_id))?;
        let mut views = self.attach_details(vec![row]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::not_found("Inventory", inventory_id))
    }

    /// Staff inventory list ordered by product then warehouse name.
    #[instrument(skip(self))]
    pub async fn list_inventory(
        &self,
        filter: InventoryFilter,
    ) -> Result<Vec<InventoryView>, ServiceError> {
        let mut query = Inventory::find();
        if let Some(warehouse_id) = filter.warehouse_id {
            query = query.filter(inventory::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(product_id) = filter.product_id {
            query = query.filter(inventory::Column::ProductId.eq(product_id));
        }
        match filter.stock_status {
            Some(StockStatus::Low) => {
                query = query.filter(
                    Expr::col(inventory::Column::Quantity)
                        .lte(Expr::col(inventory::Column::ReorderPoint)),
                )
            }
            Some(StockStatus::Out) => query = query.filter(inventory::Column::Quantity.eq(0)),
            None => {}
        }

        let rows = query.all(&*self.db).await?;
        let mut views = self.attach_details(rows).await?;

        if let Some(needle) = filter
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
        {
            views.retain(|v| {
                v.product_name.to_lowercase().contains(&needle)
                    || v.sku.to_lowercase().contains(&needle)
            });
        }

        views.sort_by(|a, b| {
            a.product_name
                .cmp(&b.product_name)
                .then_with(|| a.warehouse_name.cmp(&b.warehouse_name))
        });
        Ok(views)
    }

    /// Rows whose on-hand quantity is at or below the reorder point.
    pub async fn low_stock_report(&self) -> Result<Vec<InventoryView>, ServiceError> {
        self.list_inventory(InventoryFilter {
            stock_status: Some(StockStatus::Low),
            ..Default::default()
        })
        .await
    }

    /// Manual stock correction from the back office.
    #[instrument(skip(self))]
    pub async fn adjust_inventory(
        &self,
        inventory_id: Uuid,
        input: AdjustInventoryInput,
    ) -> Result<InventoryView, ServiceError> {
        input.validate()?;

        let before = Inventory::find_by_id(inventory_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory", inventory_id))?;

        let now = Utc::now();
        let result = match input.action {
            AdjustmentAction::Add => {
                Inventory::update_many()
                    .col_expr(
                        inventory::Column::Quantity,
                        Expr::col(inventory::Column::Quantity).add(input.quantity),
                    )
                    .col_expr(
                        inventory::Column::LastRestockDate,
                        Expr::value(now.date_naive()),
                    )
                    .col_expr(inventory::Column::UpdatedAt, Expr::value(now))
                    .filter(inventory::Column::Id.eq(inventory_id))
                    .exec(&*self.db)
                    .await?
            }
            AdjustmentAction::Subtract => {
                Inventory::update_many()
                    .col_expr(
                        inventory::Column::Quantity,
                        Expr::col(inventory::Column::Quantity).sub(input.quantity),
                    )
                    .col_expr(inventory::Column::UpdatedAt, Expr::value(now))
                    .filter(inventory::Column::Id.eq(inventory_id))
                    .filter(inventory::Column::Quantity.gte(input.quantity))
                    .exec(&*self.db)
                    .await?
            }
        };

        if result.rows_affected == 0 {
            return Err(ServiceError::ValidationError(
                "Cannot remove more than available quantity.".to_string(),
            ));
        }

        let view = self.get_inventory(inventory_id).await?;

        self.event_sender
            .send_or_log(Event::InventoryAdjusted {
                inventory_id,
                product_id: view.inventory.product_id,
                warehouse_id: view.inventory.warehouse_id,
                old_quantity: before.quantity,
                new_quantity: view.inventory.quantity,
            })
            .await;
        self.publish_low_stock(std::slice::from_ref(&view.inventory))
            .await;

        info!(
            %inventory_id,
            action = ?input.action,
            quantity = input.quantity,
            new_quantity = view.inventory.quantity,
            "Adjusted inventory"
        );
        Ok(view)
    }

    /// Inventory rows of `product_id` held in active warehouses.
    pub async fn stock_levels<C>(
        &self,
        conn: &C,
        product_id: Uuid,
    ) -> Result<Vec<(InventoryModel, WarehouseModel)>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let rows = Inventory::find()
            .filter(inventory::Column::ProductId.eq(product_id))
            .find_also_related(Warehouse)
            .all(conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(row, warehouse)| warehouse.map(|w| (row, w)))
            .filter(|(_, warehouse)| warehouse.is_active)
            .collect())
    }

    /// Sellable units of a product, or `None` when the product has no
    /// inventory rows and is therefore not stock-tracked.
    pub async fn available_stock<C>(
        &self,
        conn: &C,
        product_id: Uuid,
    ) -> Result<Option<i32>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let has_rows = Inventory::find()
            .filter(inventory::Column::ProductId.eq(product_id))
            .one(conn)
            .await?
            .is_some();
        if !has_rows {
            return Ok(None);
        }

        let levels = self.stock_levels(conn, product_id).await?;
        Ok(Some(
            levels
                .iter()
                .map(|(row, _)| row.available_quantity().max(0))
                .sum(),
        ))
    }

    /// Fails with the shopper-facing message when fewer than `requested`
    /// units are available.
    pub async fn ensure_available<C>(
        &self,
        conn: &C,
        product_id: Uuid,
        requested: i32,
    ) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        match self.available_stock(conn, product_id).await? {
            Some(available) if requested > available => Err(ServiceError::InsufficientStock(
                format!("Sorry, only {} items available.", available),
            )),
            _ => Ok(()),
        }
    }

    /// Removes `take` units from one inventory row if at least that many
    /// are still unreserved. Returns `false`, leaving the row untouched,
    /// when another writer got there first.
    pub async fn take_from_row<C>(
        &self,
        conn: &C,
        inventory_id: Uuid,
        take: i32,
    ) -> Result<bool, ServiceError>
    where
        C: ConnectionTrait,
    {
        let result = Inventory::update_many()
            .col_expr(
                inventory::Column::Quantity,
                Expr::col(inventory::Column::Quantity).sub(take),
            )
            .col_expr(inventory::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(inventory::Column::Id.eq(inventory_id))
            .filter(
                Expr::expr(
                    Expr::col(inventory::Column::Quantity)
                        .sub(Expr::col(inventory::Column::ReservedQuantity)),
                )
                .gte(take),
            )
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Takes `quantity` units of a product out of stock, drawing from the
    /// active warehouse with the most available units first. Each row is
    /// decremented with a conditional update, so a concurrent checkout that
    /// got there first makes this call fail instead of overselling. Returns
    /// the touched rows after the update; untracked products return nothing.
    pub async fn allocate<C>(
        &self,
        conn: &C,
        product: &product::Model,
        quantity: i32,
    ) -> Result<Vec<InventoryModel>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let Some(available) = self.available_stock(conn, product.id).await? else {
            return Ok(Vec::new());
        };
        if available < quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "Sorry, only {} of {} available.",
                available, product.name
            )));
        }

        let mut levels = self.stock_levels(conn, product.id).await?;
        levels.sort_by(|(a, wa), (b, wb)| {
            b.available_quantity()
                .cmp(&a.available_quantity())
                .then_with(|| wa.name.cmp(&wb.name))
        });

        let mut remaining = quantity;
        let mut touched = Vec::new();

        for (row, _) in levels {
            if remaining == 0 {
                break;
            }
            let take = row.available_quantity().min(remaining);
            if take <= 0 {
                continue;
            }

            if !self.take_from_row(conn, row.id, take).await? {
                warn!(inventory_id = %row.id, "Stock changed during checkout");
                return Err(ServiceError::InsufficientStock(format!(
                    "Sorry, {} just sold out.",
                    product.name
                )));
            }

            remaining -= take;
            touched.push(row.id);
        }

        if remaining > 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "Sorry, only {} of {} available.",
                quantity - remaining,
                product.name
            )));
        }

        Ok(Inventory::find()
            .filter(inventory::Column::Id.is_in(touched))
            .all(conn)
            .await?)
    }

    /// Stock per active warehouse for the product page.
    pub async fn product_stock(&self, product_id: Uuid) -> Result<Vec<WarehouseStock>, ServiceError> {
        let mut stock: Vec<WarehouseStock> = self
            .stock_levels(&*self.db, product_id)
            .await?
            .into_iter()
            .map(|(row, warehouse)| WarehouseStock {
                warehouse_id: warehouse.id,
                warehouse_name: warehouse.name,
                quantity: row.quantity,
                available_quantity: row.available_quantity(),
            })
            .collect();
        stock.sort_by(|a, b| a.warehouse_name.cmp(&b.warehouse_name));
        Ok(stock)
    }

    /// Emits `LowStock` for each row that needs restocking.
    pub async fn publish_low_stock(&self, rows: &[InventoryModel]) {
        for row in rows.iter().filter(|r| r.needs_restock()) {
            self.event_sender
                .send_or_log(Event::LowStock {
                    inventory_id: row.id,
                    product_id: row.product_id,
                    warehouse_id: row.warehouse_id,
                    available: row.available_quantity(),
                    reorder_point: row.reorder_point,
                })
                .await;
        }
    }

    async fn attach_details(
        &self,
        rows: Vec<InventoryModel>,
    ) -> Result<Vec<InventoryView>, ServiceError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let product_ids: Vec<Uuid> = rows.iter().map(|r| r.product_id).collect();
        let warehouse_ids: Vec<Uuid> = rows.iter().map(|r| r.warehouse_id).collect();

        let products: HashMap<Uuid, product::Model> = Product::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let warehouses: HashMap<Uuid, WarehouseModel> = Warehouse::find()
            .filter(warehouse::Column::Id.is_in(warehouse_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|w| (w.id, w))
            .collect();

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let product = products.get(&row.product_id)?;
                let warehouse = warehouses.get(&row.warehouse_id)?;
                Some(InventoryView::new(row, product, warehouse))
            })
            .collect())
    }
}
