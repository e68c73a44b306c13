use crate::{
    entities::{
        commerce::{cart_item, CartItem, Customer, CustomerModel},
        order, order_item, InventoryModel, OrderItemModel, OrderModel, OrderStatus,
        PaymentMethod, PaymentStatus, ProductModel, ShippingMethod,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        commerce::{
            cart_service::{CartOwner, CartService},
            customer_service,
            pricing_service::{self, PricingPolicy},
        },
        inventory::InventoryService,
        orders::OrderResponse,
        promotions::{AppliedPromotion, PromotionService},
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Checkout form. Everything is optional at the type level so a partially
/// filled form reaches the service and is rejected with one message.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct CheckoutInput {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub first_name: Option<String>,
    #[validate(length(max = 50))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub shipping_address_id: Option<Uuid>,
    pub billing_address_id: Option<Uuid>,
    pub shipping_method: Option<ShippingMethod>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    #[validate(length(max = 50))]
    pub promo_code: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct CheckoutChoices {
    shipping_address_id: Uuid,
    billing_address_id: Uuid,
    shipping_method: ShippingMethod,
    payment_method: PaymentMethod,
}

impl CheckoutInput {
    fn choices(&self) -> Result<CheckoutChoices, ServiceError> {
        match (
            self.shipping_address_id,
            self.billing_address_id,
            self.shipping_method,
            self.payment_method,
        ) {
            (Some(shipping_address_id), Some(billing_address_id), Some(shipping_method), Some(payment_method)) => {
                Ok(CheckoutChoices {
                    shipping_address_id,
                    billing_address_id,
                    shipping_method,
                    payment_method,
                })
            }
            _ => Err(ServiceError::ValidationError(
                "Please fill all required fields.".to_string(),
            )),
        }
    }
}

/// `ORD-` followed by eight uppercase hex characters.
pub fn generate_order_number() -> String {
    let hex: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("ORD-{}", hex.to_uppercase())
}

struct PlacedOrder {
    order: OrderModel,
    items: Vec<OrderItemModel>,
    touched_inventory: Vec<InventoryModel>,
    promotion: Option<AppliedPromotion>,
}

fn customer_missing() -> ServiceError {
    ServiceError::NotFound("Customer profile not found.".to_string())
}

fn empty_cart() -> ServiceError {
    ServiceError::ValidationError("Your cart is empty.".to_string())
}

/// Checkout service for converting carts to orders
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    carts: CartService,
    inventory: InventoryService,
    promotions: PromotionService,
    pricing: PricingPolicy,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        carts: CartService,
        inventory: InventoryService,
        promotions: PromotionService,
        pricing: PricingPolicy,
    ) -> Self {
        Self {
            db,
            event_sender,
            carts,
            inventory,
            promotions,
            pricing,
        }
    }

    /// Turns the customer's cart into an order.
    ///
    /// All checks that need no writes run first. The writes then happen in a
    /// single transaction: stock is taken, the order and its items are
    /// inserted with prices pinned, the promotion use is recorded and the
    /// cart is emptied. Any failure rolls the whole thing back.
    #[instrument(skip(self, input))]
    pub async fn place_order(
        &self,
        customer_id: Option<Uuid>,
        input: CheckoutInput,
    ) -> Result<OrderResponse, ServiceError> {
        let customer_id = customer_id.ok_or_else(customer_missing)?;
        let customer = Customer::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(customer_missing)?;

        let cart = self
            .carts
            .find_cart(&*self.db, &CartOwner::Customer(customer.id))
            .await?
            .ok_or_else(empty_cart)?;
        let item_count = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .count(&*self.db)
            .await?;
        if item_count == 0 {
            return Err(empty_cart());
        }

        let choices = input.choices()?;
        input.validate()?;

        for address_id in [choices.shipping_address_id, choices.billing_address_id] {
            if !customer_service::address_belongs_to(&*self.db, customer.id, address_id).await? {
                return Err(ServiceError::ValidationError(
                    "Selected address was not found in your address book.".to_string(),
                ));
            }
        }

        let txn = self.db.begin().await?;
        let placed = match self
            .write_order(&txn, &customer, cart.id, choices, &input)
            .await
        {
            Ok(placed) => placed,
            Err(err) => {
                warn!(customer_id = %customer.id, error = %err, "Checkout rolled back");
                txn.rollback().await?;
                return Err(err);
            }
        };
        txn.commit().await?;

        let order_id = placed.order.id;
        info!(
            order_id = %order_id,
            order_number = %placed.order.order_number,
            total = %placed.order.total,
            "Order placed"
        );

        self.event_sender
            .send_or_log(Event::OrderPlaced {
                order_id,
                order_number: placed.order.order_number.clone(),
                customer_id: customer.id,
                total: placed.order.total,
            })
            .await;
        if let Some(applied) = &placed.promotion {
            self.event_sender
                .send_or_log(Event::PromotionRedeemed {
                    promotion_id: applied.promotion.id,
                    order_id,
                })
                .await;
        }
        self.event_sender
            .send_or_log(Event::CartCleared(cart.id))
            .await;
        self.inventory
            .publish_low_stock(&placed.touched_inventory)
            .await;

        Ok(OrderResponse::new(placed.order, placed.items))
    }

    async fn write_order(
        &self,
        txn: &DatabaseTransaction,
        customer: &CustomerModel,
        cart_id: Uuid,
        choices: CheckoutChoices,
        input: &CheckoutInput,
    ) -> Result<PlacedOrder, ServiceError> {
        let lines = self.carts.load_lines(txn, cart_id).await?;
        if lines.is_empty() {
            return Err(empty_cart());
        }
        if let Some((_, product)) = lines.iter().find(|(_, p)| !p.is_active) {
            return Err(ServiceError::ValidationError(format!(
                "{} is no longer available.",
                product.name
            )));
        }

        let now = Utc::now();
        let subtotal = pricing_service::subtotal(
            lines
                .iter()
                .map(|(item, product)| (pricing_service::effective_unit_price(product), item.quantity)),
        );
        let applied = self
            .promotions
            .resolve(txn, input.promo_code.as_deref(), subtotal, now)
            .await?;
        let discount = applied.as_ref().map_or(Decimal::ZERO, |a| a.discount);
        let totals = self
            .pricing
            .totals(subtotal, discount, Some(choices.shipping_method));

        let mut per_product: Vec<(&ProductModel, i32)> = Vec::new();
        for (item, product) in &lines {
            match per_product.iter_mut().find(|(p, _)| p.id == product.id) {
                Some((_, quantity)) => *quantity += item.quantity,
                None => per_product.push((product, item.quantity)),
            }
        }

        let mut touched_inventory = Vec::new();
        for (product, quantity) in per_product {
            touched_inventory.extend(self.inventory.allocate(txn, product, quantity).await?);
        }

        let order = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(generate_order_number()),
            customer_id: Set(customer.id),
            status: Set(OrderStatus::Pending),
            shipping_address_id: Set(Some(choices.shipping_address_id)),
            billing_address_id: Set(Some(choices.billing_address_id)),
            shipping_method: Set(choices.shipping_method),
            payment_method: Set(choices.payment_method),
            payment_status: Set(PaymentStatus::Pending),
            payment_date: Set(None),
            tracking_number: Set(None),
            notes: Set(input.notes.clone().unwrap_or_default()),
            subtotal: Set(totals.subtotal),
            tax: Set(totals.tax),
            shipping_cost: Set(totals.shipping),
            discount: Set(totals.discount),
            total: Set(totals.total),
            promotion_id: Set(applied.as_ref().map(|a| a.promotion.id)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (item, product) in &lines {
            let price = pricing_service::effective_unit_price(product);
            let order_item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(product.id),
                variant_id: Set(item.variant_id),
                product_name: Set(product.name.clone()),
                sku: Set(product.sku.clone()),
                quantity: Set(item.quantity),
                price: Set(price),
                total: Set(pricing_service::line_total(price, item.quantity)),
                created_at: Set(now),
            }
            .insert(txn)
            .await?;
            items.push(order_item);
        }

        if let Some(applied) = &applied {
            self.promotions
                .record_usage(txn, applied.promotion.id)
                .await?;
        }

        self.carts.delete_items(txn, cart_id).await?;

        Ok(PlacedOrder {
            order,
            items,
            touched_inventory,
            promotion: applied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_are_prefixed_uppercase_hex() {
        let number = generate_order_number();
        assert!(number.starts_with("ORD-"));
        let suffix = &number[4..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn missing_choice_is_one_validation_error() {
        let input = CheckoutInput {
            shipping_address_id: Some(Uuid::new_v4()),
            billing_address_id: Some(Uuid::new_v4()),
            shipping_method: Some(ShippingMethod::Express),
            payment_method: None,
            ..Default::default()
        };
        match input.choices() {
            Err(ServiceError::ValidationError(msg)) => {
                assert_eq!(msg, "Please fill all required fields.")
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn complete_form_yields_choices() {
        let shipping = Uuid::new_v4();
        let input = CheckoutInput {
            shipping_address_id: Some(shipping),
            billing_address_id: Some(shipping),
            shipping_method: Some(ShippingMethod::NextDay),
            payment_method: Some(PaymentMethod::Paypal),
            ..Default::default()
        };
        let choices = input.choices().unwrap();
        assert_eq!(choices.shipping_address_id, shipping);
        assert_eq!(choices.shipping_method, ShippingMethod::NextDay);
    }

    #[test]
    fn malformed_email_fails_validation() {
        let input = CheckoutInput {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }
}
