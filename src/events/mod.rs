use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events published by the services after their writes commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderPlaced {
        order_id: Uuid,
        order_number: String,
        customer_id: Uuid,
        total: Decimal,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
        changed_by: Option<String>,
    },
    OrderUpdated(Uuid),
    PromotionRedeemed {
        promotion_id: Uuid,
        order_id: Uuid,
    },

    // Cart events
    CartCreated(Uuid),
    CartItemAdded {
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    CartCleared(Uuid),

    // Inventory events
    InventoryAdjusted {
        inventory_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
    },
    LowStock {
        inventory_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        available: i32,
        reorder_point: i32,
    },

    // Catalog and customer events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    CustomerCreated(Uuid),
    ReviewCreated {
        review_id: Uuid,
        product_id: Uuid,
        rating: i32,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::OrderPlaced { .. } => "order_placed",
            Event::OrderStatusChanged { .. } => "order_status_changed",
            Event::OrderUpdated(_) => "order_updated",
            Event::PromotionRedeemed { .. } => "promotion_redeemed",
            Event::CartCreated(_) => "cart_created",
            Event::CartItemAdded { .. } => "cart_item_added",
            Event::CartCleared(_) => "cart_cleared",
            Event::InventoryAdjusted { .. } => "inventory_adjusted",
            Event::LowStock { .. } => "low_stock",
            Event::ProductCreated(_) => "product_created",
            Event::ProductUpdated(_) => "product_updated",
            Event::CustomerCreated(_) => "customer_created",
            Event::ReviewCreated { .. } => "review_created",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, waiting for channel capacity
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Publishes without blocking the caller; a full or closed channel is
    /// logged and the event dropped.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(err) = self.sender.try_send(event) {
            warn!(event = name, error = %err, "Dropping domain event");
        }
    }
}

/// Builds a bounded channel and the sender handle the services share.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderPlaced {
                order_id,
                order_number,
                customer_id,
                total,
            } => info!(
                %order_id, %order_number, %customer_id, %total,
                "Order placed"
            ),
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
                changed_by,
            } => info!(
                %order_id, %old_status, %new_status, changed_by = ?changed_by,
                "Order status changed"
            ),
            Event::LowStock {
                inventory_id,
                product_id,
                warehouse_id,
                available,
                reorder_point,
            } => warn!(
                %inventory_id, %product_id, %warehouse_id, available, reorder_point,
                "Inventory at or below reorder point"
            ),
            Event::InventoryAdjusted {
                inventory_id,
                old_quantity,
                new_quantity,
                ..
            } => info!(
                %inventory_id, old_quantity, new_quantity,
                "Inventory adjusted"
            ),
            other => info!(event = other.name(), payload = ?other, "Domain event"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_drops_when_channel_is_full() {
        let (sender, mut rx) = channel(1);
        let cart_id = Uuid::new_v4();

        sender.send_or_log(Event::CartCreated(cart_id)).await;
        sender.send_or_log(Event::CartCleared(cart_id)).await;

        assert_eq!(rx.recv().await, Some(Event::CartCreated(cart_id)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (sender, rx) = channel(4);
        drop(rx);
        assert!(sender.send(Event::ProductCreated(Uuid::new_v4())).await.is_err());
        sender.send_or_log(Event::ProductCreated(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn processor_exits_when_senders_drop() {
        let (sender, rx) = channel(4);
        let handle = tokio::spawn(process_events(rx));
        sender
            .send(Event::ReviewCreated {
                review_id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                rating: 5,
            })
            .await
            .unwrap();
        drop(sender);
        handle.await.unwrap();
    }
}
