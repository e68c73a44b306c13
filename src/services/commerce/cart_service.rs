use crate::{
    entities::{
        commerce::{cart, cart_item, Cart, CartItem, CartItemModel, CartModel, Customer, ProductVariant},
        order::ShippingMethod,
        product, Product, ProductModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        commerce::pricing_service::{self, OrderTotals, PricingPolicy},
        inventory::InventoryService,
        promotions::{AppliedPromotionView, PromotionService},
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Whose cart an operation works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    Customer(Uuid),
    Session(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct AddToCartInput {
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub variant_id: Option<Uuid>,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCartItemInput {
    /// 0 removes the line
    #[validate(range(min = 0, max = 1000))]
    pub quantity: i32,
}

/// One cart line priced at the current catalog price
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLine {
    pub item_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub slug: String,
    pub sku: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartView {
    pub cart_id: Uuid,
    pub lines: Vec<CartLine>,
    pub item_count: i32,
    pub promotion: Option<AppliedPromotionView>,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

/// Shopping cart for customers and anonymous visitors.
///
/// Line prices are never stored; every read prices the cart at the current
/// catalog price, so totals follow price changes while items sit in the cart.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    inventory: InventoryService,
    promotions: PromotionService,
    pricing: PricingPolicy,
}

impl CartService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        inventory: InventoryService,
        promotions: PromotionService,
        pricing: PricingPolicy,
    ) -> Self {
        Self {
            db,
            event_sender,
            inventory,
            promotions,
            pricing,
        }
    }

    /// Existing cart of `owner`, without creating one.
    pub async fn find_cart<C>(&self, conn: &C, owner: &CartOwner) -> Result<Option<CartModel>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let query = match owner {
            CartOwner::Customer(customer_id) => {
                Cart::find().filter(cart::Column::CustomerId.eq(*customer_id))
            }
            CartOwner::Session(key) => Cart::find()
                .filter(cart::Column::SessionKey.eq(key.as_str()))
                .filter(cart::Column::CustomerId.is_null()),
        };
        Ok(query.one(conn).await?)
    }

    async fn get_or_create_cart<C>(&self, conn: &C, owner: &CartOwner) -> Result<CartModel, ServiceError>
    where
        C: ConnectionTrait,
    {
        if let Some(cart) = self.find_cart(conn, owner).await? {
            return Ok(cart);
        }

        if let CartOwner::Customer(customer_id) = owner {
            Customer::find_by_id(*customer_id)
                .one(conn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Customer profile not found.".to_string()))?;
        }

        let (customer_id, session_key) = match owner {
            CartOwner::Customer(id) => (Some(*id), None),
            CartOwner::Session(key) => (None, Some(key.clone())),
        };
        let now = Utc::now();
        let cart_id = Uuid::new_v4();
        let inserted = Cart::insert(cart::ActiveModel {
            id: Set(cart_id),
            customer_id: Set(customer_id),
            session_key: Set(session_key),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .on_conflict(OnConflict::new().do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;

        // a cart created concurrently wins over ours
        let cart = self
            .find_cart(conn, owner)
            .await?
            .ok_or_else(|| ServiceError::InternalError(format!("cart {} vanished after insert", cart_id)))?;

        if inserted > 0 {
            self.event_sender
                .send_or_log(Event::CartCreated(cart.id))
                .await;
            info!("Created cart: {}", cart.id);
        }
        Ok(cart)
    }

    /// Cart items joined with their products, oldest line first.
    pub async fn load_lines<C>(
        &self,
        conn: &C,
        cart_id: Uuid,
    ) -> Result<Vec<(CartItemModel, ProductModel)>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let rows = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .find_also_related(Product)
            .all(conn)
            .await?;

        let mut lines: Vec<(CartItemModel, ProductModel)> = rows
            .into_iter()
            .filter_map(|(item, product)| product.map(|p| (item, p)))
            .collect();
        lines.sort_by(|(a, _), (b, _)| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(lines)
    }

    #[instrument(skip(self))]
    pub async fn view_cart(
        &self,
        owner: &CartOwner,
        shipping_method: Option<ShippingMethod>,
    ) -> Result<CartView, ServiceError> {
        let cart = self.get_or_create_cart(&*self.db, owner).await?;
        self.render(&*self.db, cart.id, shipping_method).await
    }

    /// Adds `quantity` of a product, merging into an existing line for the
    /// same product and variant.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        owner: &CartOwner,
        product_id: Uuid,
        input: AddToCartInput,
    ) -> Result<CartView, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let product = Product::find_by_id(product_id)
            .filter(product::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        if let Some(variant_id) = input.variant_id {
            let variant = ProductVariant::find_by_id(variant_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Variant", variant_id))?;
            if variant.product_id != product.id {
                return Err(ServiceError::ValidationError(
                    "Variant does not belong to this product".to_string(),
                ));
            }
        }

        let cart = self.get_or_create_cart(&txn, owner).await?;
        let items = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::ProductId.eq(product.id))
            .all(&txn)
            .await?;

        let existing = items
            .iter()
            .find(|item| item.variant_id == input.variant_id)
            .cloned();
        let in_cart: i32 = items.iter().map(|item| item.quantity).sum();

        self.inventory
            .ensure_available(&txn, product.id, in_cart + input.quantity)
            .await?;

        let now = Utc::now();
        match existing {
            Some(item) => {
                let quantity = item.quantity + input.quantity;
                let mut item: cart_item::ActiveModel = item.into();
                item.quantity = Set(quantity);
                item.updated_at = Set(now);
                item.update(&txn).await?;
            }
            None => {
                let inserted = CartItem::insert(cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart.id),
                    product_id: Set(product.id),
                    variant_id: Set(input.variant_id),
                    quantity: Set(input.quantity),
                    created_at: Set(now),
                    updated_at: Set(now),
                })
                .on_conflict(OnConflict::new().do_nothing().to_owned())
                .exec_without_returning(&txn)
                .await?;

                if inserted == 0 {
                    // the line appeared since it was read; merge into it
                    let mut merge = CartItem::update_many()
                        .col_expr(
                            cart_item::Column::Quantity,
                            Expr::col(cart_item::Column::Quantity).add(input.quantity),
                        )
                        .col_expr(cart_item::Column::UpdatedAt, Expr::value(now))
                        .filter(cart_item::Column::CartId.eq(cart.id))
                        .filter(cart_item::Column::ProductId.eq(product.id));
                    merge = match input.variant_id {
                        Some(variant_id) => merge.filter(cart_item::Column::VariantId.eq(variant_id)),
                        None => merge.filter(cart_item::Column::VariantId.is_null()),
                    };
                    merge.exec(&txn).await?;
                }
            }
        }

        let view = self.render(&txn, cart.id, None).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id: cart.id,
                product_id,
                quantity: input.quantity,
            })
            .await;

        info!(cart_id = %cart.id, %product_id, quantity = input.quantity, "Added item to cart");
        Ok(view)
    }

    /// Sets a line's quantity; 0 removes it.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        owner: &CartOwner,
        item_id: Uuid,
        input: UpdateCartItemInput,
    ) -> Result<CartView, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;
        let (cart, item) = self.owned_item(&txn, owner, item_id).await?;

        if input.quantity == 0 {
            CartItem::delete_by_id(item.id).exec(&txn).await?;
        } else {
            let others: i32 = CartItem::find()
                .filter(cart_item::Column::CartId.eq(cart.id))
                .filter(cart_item::Column::ProductId.eq(item.product_id))
                .filter(cart_item::Column::Id.ne(item.id))
                .all(&txn)
                .await?
                .iter()
                .map(|other| other.quantity)
                .sum();

            self.inventory
                .ensure_available(&txn, item.product_id, others + input.quantity)
                .await?;

            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(input.quantity);
            item.updated_at = Set(Utc::now());
            item.update(&txn).await?;
        }

        let view = self.render(&txn, cart.id, None).await?;
        txn.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, owner: &CartOwner, item_id: Uuid) -> Result<CartView, ServiceError> {
        let (cart, item) = self.owned_item(&*self.db, owner, item_id).await?;
        CartItem::delete_by_id(item.id).exec(&*self.db).await?;
        self.render(&*self.db, cart.id, None).await
    }

    #[instrument(skip(self))]
    pub async fn clear_cart(&self, owner: &CartOwner) -> Result<CartView, ServiceError> {
        let cart = self.get_or_create_cart(&*self.db, owner).await?;
        self.delete_items(&*self.db, cart.id).await?;
        self.event_sender
            .send_or_log(Event::CartCleared(cart.id))
            .await;
        self.render(&*self.db, cart.id, None).await
    }

    pub async fn delete_items<C>(&self, conn: &C, cart_id: Uuid) -> Result<u64, ServiceError>
    where
        C: ConnectionTrait,
    {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn owned_item<C>(
        &self,
        conn: &C,
        owner: &CartOwner,
        item_id: Uuid,
    ) -> Result<(CartModel, CartItemModel), ServiceError>
    where
        C: ConnectionTrait,
    {
        let not_found = || ServiceError::not_found("Cart item", item_id);
        let cart = self.find_cart(conn, owner).await?.ok_or_else(not_found)?;
        let item = CartItem::find_by_id(item_id)
            .filter(cart_item::Column::CartId.eq(cart.id))
            .one(conn)
            .await?
            .ok_or_else(not_found)?;
        Ok((cart, item))
    }

    async fn render<C>(
        &self,
        conn: &C,
        cart_id: Uuid,
        shipping_method: Option<ShippingMethod>,
    ) -> Result<CartView, ServiceError>
    where
        C: ConnectionTrait,
    {
        let lines: Vec<CartLine> = self
            .load_lines(conn, cart_id)
            .await?
            .into_iter()
            .map(|(item, product)| {
                let unit_price = pricing_service::effective_unit_price(&product);
                CartLine {
                    item_id: item.id,
                    product_id: product.id,
                    variant_id: item.variant_id,
                    product_name: product.name,
                    slug: product.slug,
                    sku: product.sku,
                    quantity: item.quantity,
                    unit_price,
                    line_total: pricing_service::line_total(unit_price, item.quantity),
                }
            })
            .collect();

        let subtotal = pricing_service::subtotal(lines.iter().map(|l| (l.unit_price, l.quantity)));
        let applied = self
            .promotions
            .best_for_subtotal(conn, subtotal, Utc::now())
            .await?;
        let discount = applied.as_ref().map_or(Decimal::ZERO, |a| a.discount);
        let totals = self.pricing.totals(subtotal, discount, shipping_method);

        Ok(CartView {
            cart_id,
            item_count: lines.iter().map(|l| l.quantity).sum(),
            lines,
            promotion: applied.as_ref().map(AppliedPromotionView::from),
            totals,
        })
    }
}
