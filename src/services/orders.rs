use crate::{
    db::DbPool,
    entities::{
        commerce::{Customer, CustomerModel},
        order::{self, ActiveModel as OrderActiveModel},
        order_item, order_status_history, Order, OrderItem, OrderItemModel, OrderModel,
        OrderStatus, OrderStatusHistory, OrderStatusHistoryModel, PaymentMethod, PaymentStatus,
        ShippingMethod,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request/Response types for the order service
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    #[validate(length(max = 100))]
    pub changed_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderRequest {
    pub shipping_method: Option<ShippingMethod>,
    #[validate(length(max = 100))]
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub payment_status: Option<PaymentStatus>,
}

/// Staff order list filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Matches order number, customer email or customer name
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    pub price: Decimal,
    pub total: Decimal,
}

impl From<OrderItemModel> for OrderItemResponse {
    fn from(item: OrderItemModel) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            variant_id: item.variant_id,
            product_name: item.product_name,
            sku: item.sku,
            quantity: item.quantity,
            price: item.price,
            total: item.total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub shipping_address_id: Option<Uuid>,
    pub billing_address_id: Option<Uuid>,
    pub shipping_method: ShippingMethod,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub notes: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub promotion_id: Option<Uuid>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderResponse {
    pub fn new(order: OrderModel, items: Vec<OrderItemModel>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            customer_id: order.customer_id,
            status: order.status,
            shipping_address_id: order.shipping_address_id,
            billing_address_id: order.billing_address_id,
            shipping_method: order.shipping_method,
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            payment_date: order.payment_date,
            tracking_number: order.tracking_number,
            notes: order.notes,
            subtotal: order.subtotal,
            tax: order.tax,
            shipping_cost: order.shipping_cost,
            discount: order.discount,
            total: order.total,
            promotion_id: order.promotion_id,
            items: items.into_iter().map(OrderItemResponse::from).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Row of the staff order list
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: OrderModel,
    pub customer_name: String,
    pub customer_email: String,
}

/// Staff order page: the order, who placed it, and its status timeline
/// newest first
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: OrderResponse,
    pub customer: CustomerModel,
    pub status_history: Vec<OrderStatusHistoryModel>,
}

/// Newest first; ties broken by order number for a stable listing.
pub fn newest_first(a: &OrderModel, b: &OrderModel) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.order_number.cmp(&a.order_number))
}

pub fn sort_newest_first(orders: &mut [OrderModel]) {
    orders.sort_by(newest_first);
}

/// Service for reading and fulfilling placed orders
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    /// Creates a new order service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub async fn load_items<C>(&self, conn: &C, order_id: Uuid) -> Result<Vec<OrderItemModel>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let mut items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(conn)
            .await?;
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn find_order(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        Order::find_by_id(order_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order from database");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))
    }

    /// Retrieves an order with its line items
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let order = self.find_order(order_id).await?;
        let items = self.load_items(&*self.db_pool, order_id).await?;
        Ok(OrderResponse::new(order, items))
    }

    /// Order confirmation; only the customer who placed it can see it.
    #[instrument(skip(self), fields(order_id = %order_id, customer_id = %customer_id))]
    pub async fn get_customer_order(
        &self,
        customer_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let order = Order::find_by_id(order_id)
            .filter(order::Column::CustomerId.eq(customer_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
        let items = self.load_items(&*self.db_pool, order_id).await?;
        Ok(OrderResponse::new(order, items))
    }

    /// A customer's orders, newest first, optionally capped at `limit`.
    pub async fn list_customer_orders(
        &self,
        customer_id: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<OrderModel>, ServiceError> {
        let mut orders = Order::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .all(&*self.db_pool)
            .await?;
        sort_newest_first(&mut orders);
        if let Some(limit) = limit {
            orders.truncate(limit);
        }
        Ok(orders)
    }

    /// Staff order list, newest first
    #[instrument(skip(self))]
    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderSummary>, ServiceError> {
        let mut query = Order::find();
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let rows = query
            .find_also_related(Customer)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list orders");
                ServiceError::DatabaseError(e)
            })?;

        let needle = filter
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let mut summaries: Vec<OrderSummary> = rows
            .into_iter()
            .filter_map(|(order, customer)| customer.map(|c| (order, c)))
            .filter(|(order, _)| {
                let day = order.created_at.date_naive();
                filter.start_date.map_or(true, |start| day >= start)
                    && filter.end_date.map_or(true, |end| day <= end)
            })
            .filter(|(order, customer)| match &needle {
                Some(q) => {
                    order.order_number.to_lowercase().contains(q)
                        || customer.email.to_lowercase().contains(q)
                        || customer.full_name().to_lowercase().contains(q)
                }
                None => true,
            })
            .map(|(order, customer)| OrderSummary {
                customer_name: customer.full_name(),
                customer_email: customer.email,
                order,
            })
            .collect();

        summaries.sort_by(|a, b| newest_first(&a.order, &b.order));

        info!(returned_count = summaries.len(), "Orders listed successfully");
        Ok(summaries)
    }

    /// Order, customer and status timeline for the staff order page
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order_detail(&self, order_id: Uuid) -> Result<OrderDetail, ServiceError> {
        let order = self.get_order(order_id).await?;
        let customer = Customer::find_by_id(order.customer_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", order.customer_id))?;
        let mut status_history = self.status_history(order_id).await?;
        status_history.reverse();

        Ok(OrderDetail {
            order,
            customer,
            status_history,
        })
    }

    /// Status changes of an order, oldest first.
    pub async fn status_history(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderStatusHistoryModel>, ServiceError> {
        let mut history = OrderStatusHistory::find()
            .filter(order_status_history::Column::OrderId.eq(order_id))
            .all(&*self.db_pool)
            .await?;
        history.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(history)
    }

    /// Sets an order's status. Any status may follow any other; a change
    /// appends one history row, setting the current status changes nothing.
    #[instrument(skip(self, request), fields(order_id = %order_id, new_status = %request.status))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start transaction for status update");
            ServiceError::DatabaseError(e)
        })?;

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for status update");
                ServiceError::not_found("Order", order_id)
            })?;

        if order.status == request.status {
            let items = self.load_items(&txn, order_id).await?;
            txn.commit().await?;
            return Ok(OrderResponse::new(order, items));
        }

        let old_status = order.status;
        let mut order_active_model: OrderActiveModel = order.into();
        order_active_model.status = Set(request.status);
        order_active_model.updated_at = Set(now);
        let updated_order = order_active_model.update(&txn).await?;

        order_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            status: Set(request.status),
            changed_by: Set(request.changed_by.clone()),
            timestamp: Set(now),
        }
        .insert(&txn)
        .await?;

        let items = self.load_items(&txn, order_id).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit status update transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, old_status = %old_status, new_status = %request.status, "Order status updated successfully");

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: old_status.to_string(),
                new_status: request.status.to_string(),
                changed_by: request.changed_by,
            })
            .await;

        Ok(OrderResponse::new(updated_order, items))
    }

    /// Staff edit of fulfilment and payment details.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: Uuid,
        request: UpdateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let order = self.find_order(order_id).await?;
        let now = Utc::now();
        let already_paid = order.payment_date.is_some();

        let mut model: OrderActiveModel = order.into();
        if let Some(method) = request.shipping_method {
            model.shipping_method = Set(method);
        }
        if let Some(tracking) = request.tracking_number {
            let tracking = tracking.trim().to_string();
            model.tracking_number = Set((!tracking.is_empty()).then_some(tracking));
        }
        if let Some(notes) = request.notes {
            model.notes = Set(notes);
        }
        if let Some(payment_status) = request.payment_status {
            model.payment_status = Set(payment_status);
            if payment_status == PaymentStatus::Paid && !already_paid {
                model.payment_date = Set(Some(now));
            }
        }
        model.updated_at = Set(now);

        let updated = model.update(&*self.db_pool).await?;
        let items = self.load_items(&*self.db_pool, order_id).await?;

        self.event_sender
            .send_or_log(Event::OrderUpdated(order_id))
            .await;

        Ok(OrderResponse::new(updated, items))
    }
}
