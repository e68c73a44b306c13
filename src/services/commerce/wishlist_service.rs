use crate::{
    entities::{
        commerce::{
            wishlist::{self, DEFAULT_WISHLIST_NAME},
            wishlist_item, ProductVariant, Wishlist, WishlistItem, WishlistItemModel,
            WishlistModel,
        },
        product, Product,
    },
    errors::{is_unique_violation, ServiceError},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct CreateWishlistInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AddWishlistItemInput {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WishlistItemView {
    #[serde(flatten)]
    pub item: WishlistItemModel,
    pub product_name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WishlistView {
    #[serde(flatten)]
    pub wishlist: WishlistModel,
    pub items: Vec<WishlistItemView>,
}

#[derive(Clone)]
pub struct WishlistService {
    db: Arc<DatabaseConnection>,
}

impl WishlistService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_wishlist(
        &self,
        customer_id: Uuid,
        input: CreateWishlistInput,
    ) -> Result<WishlistView, ServiceError> {
        input.validate()?;

        let name = input
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_WISHLIST_NAME.to_string());
        let now = Utc::now();

        let wishlist = wishlist::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            name: Set(name),
            is_public: Set(input.is_public.unwrap_or(false)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(wishlist_id = %wishlist.id, %customer_id, "Created wishlist");
        Ok(WishlistView {
            wishlist,
            items: Vec::new(),
        })
    }

    /// The customer's wishlists, oldest first, each with its items.
    pub async fn list_wishlists(&self, customer_id: Uuid) -> Result<Vec<WishlistView>, ServiceError> {
        let mut wishlists = Wishlist::find()
            .filter(wishlist::Column::CustomerId.eq(customer_id))
            .find_with_related(WishlistItem)
            .all(&*self.db)
            .await?;
        wishlists.sort_by(|(a, _), (b, _)| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let product_ids: Vec<Uuid> = wishlists
            .iter()
            .flat_map(|(_, items)| items.iter().map(|i| i.product_id))
            .collect();
        let products: HashMap<Uuid, product::Model> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            Product::find()
                .filter(product::Column::Id.is_in(product_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        Ok(wishlists
            .into_iter()
            .map(|(wishlist, mut items)| {
                items.sort_by(|a, b| a.added_at.cmp(&b.added_at));
                WishlistView {
                    wishlist,
                    items: items
                        .into_iter()
                        .map(|item| {
                            let product = products.get(&item.product_id);
                            WishlistItemView {
                                product_name: product.map(|p| p.name.clone()).unwrap_or_default(),
                                slug: product.map(|p| p.slug.clone()).unwrap_or_default(),
                                item,
                            }
                        })
                        .collect(),
                }
            })
            .collect())
    }

    async fn owned_wishlist(&self, customer_id: Uuid, wishlist_id: Uuid) -> Result<WishlistModel, ServiceError> {
        let wishlist = Wishlist::find_by_id(wishlist_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Wishlist", wishlist_id))?;
        if wishlist.customer_id != customer_id {
            return Err(ServiceError::Forbidden(
                "You can only change your own wishlists".to_string(),
            ));
        }
        Ok(wishlist)
    }

    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        customer_id: Uuid,
        wishlist_id: Uuid,
        input: AddWishlistItemInput,
    ) -> Result<WishlistItemView, ServiceError> {
        input.validate()?;
        let wishlist = self.owned_wishlist(customer_id, wishlist_id).await?;

        let product = Product::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", input.product_id))?;

        if let Some(variant_id) = input.variant_id {
            let variant = ProductVariant::find_by_id(variant_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Variant", variant_id))?;
            if variant.product_id != product.id {
                return Err(ServiceError::ValidationError(
                    "Variant does not belong to this product".to_string(),
                ));
            }
        }

        let mut duplicate = WishlistItem::find()
            .filter(wishlist_item::Column::WishlistId.eq(wishlist.id))
            .filter(wishlist_item::Column::ProductId.eq(product.id));
        duplicate = match input.variant_id {
            Some(variant_id) => duplicate.filter(wishlist_item::Column::VariantId.eq(variant_id)),
            None => duplicate.filter(wishlist_item::Column::VariantId.is_null()),
        };
        if duplicate.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "{} is already in {}",
                product.name, wishlist.name
            )));
        }

        let item = wishlist_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            wishlist_id: Set(wishlist.id),
            product_id: Set(product.id),
            variant_id: Set(input.variant_id),
            notes: Set(input.notes.unwrap_or_default()),
            added_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                ServiceError::Conflict(format!("{} is already in {}", product.name, wishlist.name))
            } else {
                err.into()
            }
        })?;

        Ok(WishlistItemView {
            item,
            product_name: product.name,
            slug: product.slug,
        })
    }

    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        customer_id: Uuid,
        wishlist_id: Uuid,
        item_id: Uuid,
    ) -> Result<(), ServiceError> {
        let wishlist = self.owned_wishlist(customer_id, wishlist_id).await?;
        let result = WishlistItem::delete_many()
            .filter(wishlist_item::Column::Id.eq(item_id))
            .filter(wishlist_item::Column::WishlistId.eq(wishlist.id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Wishlist item", item_id));
        }
        Ok(())
    }

    /// Whether the product sits in any of the customer's wishlists.
    pub async fn contains_product(&self, customer_id: Uuid, product_id: Uuid) -> Result<bool, ServiceError> {
        let wishlist_ids: Vec<Uuid> = Wishlist::find()
            .filter(wishlist::Column::CustomerId.eq(customer_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|w| w.id)
            .collect();
        if wishlist_ids.is_empty() {
            return Ok(false);
        }
        Ok(WishlistItem::find()
            .filter(wishlist_item::Column::WishlistId.is_in(wishlist_ids))
            .filter(wishlist_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?
            .is_some())
    }
}
