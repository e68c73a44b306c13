use crate::{
    entities::{
        commerce::{
            address, customer, customer_address, product_review, Address, AddressModel,
            AddressType, Customer, CustomerAddress, CustomerModel, ProductReview,
            ProductReviewModel,
        },
        OrderModel, Product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        commerce::{
            pricing_service::round_money,
            wishlist_service::{WishlistService, WishlistView},
        },
        orders::OrderService,
    },
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Number of orders shown on the account page
pub const RECENT_ORDER_LIMIT: usize = 5;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateCustomerInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub is_subscribed_to_newsletter: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AddAddressInput {
    #[validate(length(min = 1, max = 255))]
    pub line1: String,
    #[validate(length(max = 255))]
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[serde(default = "default_address_type")]
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
}

fn default_address_type() -> AddressType {
    AddressType::Both
}

/// Address-book entry
#[derive(Debug, Clone, Serialize)]
pub struct CustomerAddressView {
    pub id: Uuid,
    pub address_type: AddressType,
    pub address: AddressModel,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerReview {
    #[serde(flatten)]
    pub review: ProductReviewModel,
    pub product_name: String,
}

/// Staff view of a customer with order statistics
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetail {
    pub customer: CustomerModel,
    pub orders: Vec<OrderModel>,
    pub reviews: Vec<CustomerReview>,
    pub addresses: Vec<CustomerAddressView>,
    pub order_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_spent: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_order_value: Option<Decimal>,
}

/// What the customer sees on their account page
#[derive(Debug, Clone, Serialize)]
pub struct AccountOverview {
    pub customer: CustomerModel,
    pub recent_orders: Vec<OrderModel>,
    pub addresses: Vec<CustomerAddressView>,
    pub wishlists: Vec<WishlistView>,
}

/// Total and mean order value; both absent when there are no orders.
pub fn order_statistics(orders: &[OrderModel]) -> (Option<Decimal>, Option<Decimal>) {
    if orders.is_empty() {
        return (None, None);
    }
    let total: Decimal = orders.iter().map(|o| o.total).sum();
    let average = round_money(total / Decimal::from(orders.len()));
    (Some(total), Some(average))
}

/// Whether `address_id` is in the customer's address book.
pub async fn address_belongs_to<C>(conn: &C, customer_id: Uuid, address_id: Uuid) -> Result<bool, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(CustomerAddress::find()
        .filter(customer_address::Column::CustomerId.eq(customer_id))
        .filter(customer_address::Column::AddressId.eq(address_id))
        .one(conn)
        .await?
        .is_some())
}

/// Customer profiles and address books
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    orders: OrderService,
    wishlists: WishlistService,
}

impl CustomerService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        orders: OrderService,
        wishlists: WishlistService,
    ) -> Self {
        Self {
            db,
            event_sender,
            orders,
            wishlists,
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create_customer(&self, input: CreateCustomerInput) -> Result<CustomerModel, ServiceError> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        let existing = Customer::find()
            .filter(customer::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "A customer with email {} already exists",
                email
            )));
        }

        let now = Utc::now();
        let customer = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            phone: Set(input.phone),
            birth_date: Set(input.birth_date),
            is_subscribed_to_newsletter: Set(input.is_subscribed_to_newsletter.unwrap_or(false)),
            loyalty_points: Set(0),
            notes: Set(input.notes.unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::CustomerCreated(customer.id))
            .await;
        info!("Created customer: {}", customer.id);
        Ok(customer)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<CustomerModel, ServiceError> {
        Customer::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))
    }

    /// Profile of the calling customer; a missing or unknown id means the
    /// caller has no customer profile.
    pub async fn require_customer(&self, customer_id: Option<Uuid>) -> Result<CustomerModel, ServiceError> {
        let missing = || ServiceError::NotFound("Customer profile not found.".to_string());
        let customer_id = customer_id.ok_or_else(missing)?;
        Customer::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(missing)
    }

    /// Creates an address and links it into the customer's address book.
    /// A new default address replaces the previous default.
    #[instrument(skip(self, input))]
    pub async fn add_address(
        &self,
        customer_id: Uuid,
        input: AddAddressInput,
    ) -> Result<CustomerAddressView, ServiceError> {
        input.validate()?;
        self.get_customer(customer_id).await?;

        let txn = self.db.begin().await?;
        let now = Utc::now();

        if input.is_default {
            let linked: Vec<Uuid> = CustomerAddress::find()
                .filter(customer_address::Column::CustomerId.eq(customer_id))
                .all(&txn)
                .await?
                .into_iter()
                .map(|link| link.address_id)
                .collect();
            if !linked.is_empty() {
                Address::update_many()
                    .col_expr(address::Column::IsDefault, Expr::value(false))
                    .filter(address::Column::Id.is_in(linked))
                    .exec(&txn)
                    .await?;
            }
        }

        let address = address::ActiveModel {
            id: Set(Uuid::new_v4()),
            line1: Set(input.line1),
            line2: Set(input.line2),
            city: Set(input.city),
            state: Set(input.state),
            postal_code: Set(input.postal_code),
            country: Set(input.country),
            is_default: Set(input.is_default),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let link = customer_address::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            address_id: Set(address.id),
            address_type: Set(input.address_type),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(%customer_id, address_id = %address.id, "Added address to address book");
        Ok(CustomerAddressView {
            id: link.id,
            address_type: link.address_type,
            address,
        })
    }

    pub async fn list_addresses(&self, customer_id: Uuid) -> Result<Vec<CustomerAddressView>, ServiceError> {
        let mut addresses: Vec<CustomerAddressView> = CustomerAddress::find()
            .filter(customer_address::Column::CustomerId.eq(customer_id))
            .find_also_related(Address)
            .all(&*self.db)
            .await?
            .into_iter()
            .filter_map(|(link, address)| {
                address.map(|address| CustomerAddressView {
                    id: link.id,
                    address_type: link.address_type,
                    address,
                })
            })
            .collect();
        addresses.sort_by(|a, b| {
            b.address
                .is_default
                .cmp(&a.address.is_default)
                .then_with(|| a.address.created_at.cmp(&b.address.created_at))
        });
        Ok(addresses)
    }

    /// Staff customer list ordered by last then first name, optionally
    /// searched on name, email and phone.
    #[instrument(skip(self))]
    pub async fn list_customers(&self, q: Option<String>) -> Result<Vec<CustomerModel>, ServiceError> {
        let mut query = Customer::find();

        if let Some(q) = q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", q.to_lowercase());
            let mut condition = Condition::any();
            for column in [
                customer::Column::FirstName,
                customer::Column::LastName,
                customer::Column::Email,
                customer::Column::Phone,
            ] {
                condition = condition.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern.as_str()));
            }
            query = query.filter(condition);
        }

        let mut customers = query.all(&*self.db).await?;
        customers.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(customers)
    }

    #[instrument(skip(self))]
    pub async fn customer_detail(&self, customer_id: Uuid) -> Result<CustomerDetail, ServiceError> {
        let customer = self.get_customer(customer_id).await?;
        let orders = self.orders.list_customer_orders(customer_id, None).await?;

        let reviews = ProductReview::find()
            .filter(product_review::Column::CustomerId.eq(customer_id))
            .find_also_related(Product)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|(review, product)| CustomerReview {
                product_name: product.map(|p| p.name).unwrap_or_default(),
                review,
            })
            .collect();

        let addresses = self.list_addresses(customer_id).await?;
        let (total_spent, avg_order_value) = order_statistics(&orders);

        Ok(CustomerDetail {
            customer,
            order_count: orders.len(),
            orders,
            reviews,
            addresses,
            total_spent,
            avg_order_value,
        })
    }

    /// Account page of the calling customer
    #[instrument(skip(self))]
    pub async fn account_overview(&self, customer_id: Option<Uuid>) -> Result<AccountOverview, ServiceError> {
        let customer = self.require_customer(customer_id).await?;
        let recent_orders = self
            .orders
            .list_customer_orders(customer.id, Some(RECENT_ORDER_LIMIT))
            .await?;
        let addresses = self.list_addresses(customer.id).await?;
        let wishlists = self.wishlists.list_wishlists(customer.id).await?;

        Ok(AccountOverview {
            customer,
            recent_orders,
            addresses,
            wishlists,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{OrderStatus, PaymentMethod, PaymentStatus, ShippingMethod};
    use rust_decimal_macros::dec;

    fn order_with_total(total: Decimal) -> OrderModel {
        let now = Utc::now();
        OrderModel {
            id: Uuid::new_v4(),
            order_number: "ORD-00000000".into(),
            customer_id: Uuid::new_v4(),
            status: OrderStatus::Delivered,
            shipping_address_id: None,
            billing_address_id: None,
            shipping_method: ShippingMethod::Standard,
            payment_method: PaymentMethod::BankTransfer,
            payment_status: PaymentStatus::Paid,
            payment_date: Some(now),
            tracking_number: None,
            notes: String::new(),
            subtotal: total,
            tax: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            discount: Decimal::ZERO,
            total,
            promotion_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn no_orders_means_no_statistics() {
        assert_eq!(order_statistics(&[]), (None, None));
    }

    #[test]
    fn statistics_sum_and_average() {
        let orders = [
            order_with_total(dec!(100.00)),
            order_with_total(dec!(50.00)),
            order_with_total(dec!(25.00)),
        ];
        let (total, avg) = order_statistics(&orders);
        assert_eq!(total, Some(dec!(175.00)));
        assert_eq!(avg, Some(dec!(58.33)));
    }

    #[test]
    fn address_type_defaults_to_both() {
        let input: AddAddressInput = serde_json::from_value(serde_json::json!({
            "line1": "1 Garden Way",
            "city": "Portland",
            "state": "OR",
            "postal_code": "97201",
            "country": "US"
        }))
        .unwrap();
        assert_eq!(input.address_type, AddressType::Both);
        assert!(!input.is_default);
    }
}
