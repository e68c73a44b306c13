use crate::{
    entities::{
        commerce::{product_review, Customer, ProductReview, ProductReviewModel},
        order, order_item, product, OrderItem, Product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType,
    QueryFilter, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateReviewInput {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1))]
    pub comment: String,
}

/// Mean star rating rounded to two places; 0 when there are no ratings.
pub fn average_rating(ratings: &[i32]) -> Decimal {
    if ratings.is_empty() {
        return Decimal::ZERO;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    (Decimal::from(sum) / Decimal::from(ratings.len()))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Newest first.
pub fn sort_newest_first(reviews: &mut [ProductReviewModel]) {
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Posts a review for the product at `slug`. One review per customer
    /// per product; a review is marked verified when the customer has
    /// bought the product.
    #[instrument(skip(self, input))]
    pub async fn create_review(
        &self,
        customer_id: Option<Uuid>,
        slug: &str,
        input: CreateReviewInput,
    ) -> Result<ProductReviewModel, ServiceError> {
        let missing = || ServiceError::NotFound("Customer profile not found.".to_string());
        let customer = Customer::find_by_id(customer_id.ok_or_else(missing)?)
            .one(&*self.db)
            .await?
            .ok_or_else(missing)?;

        input.validate()?;

        let product = Product::find()
            .filter(product::Column::Slug.eq(slug))
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", slug))?;

        let existing = ProductReview::find()
            .filter(product_review::Column::ProductId.eq(product.id))
            .filter(product_review::Column::CustomerId.eq(customer.id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "You have already reviewed this product.".to_string(),
            ));
        }

        let purchased = OrderItem::find()
            .join(JoinType::InnerJoin, order_item::Relation::Order.def())
            .filter(order_item::Column::ProductId.eq(product.id))
            .filter(order::Column::CustomerId.eq(customer.id))
            .one(&*self.db)
            .await?;

        let now = Utc::now();
        let review = product_review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            customer_id: Set(customer.id),
            order_item_id: Set(purchased.as_ref().map(|item| item.id)),
            rating: Set(input.rating),
            title: Set(input.title),
            comment: Set(input.comment),
            verified_purchase: Set(purchased.is_some()),
            helpful_votes: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::ReviewCreated {
                review_id: review.id,
                product_id: product.id,
                rating: review.rating,
            })
            .await;
        info!(review_id = %review.id, product = %product.slug, "Review created");
        Ok(review)
    }

    /// Adds one helpful vote.
    #[instrument(skip(self))]
    pub async fn mark_helpful(&self, review_id: Uuid) -> Result<ProductReviewModel, ServiceError> {
        let result = ProductReview::update_many()
            .col_expr(
                product_review::Column::HelpfulVotes,
                Expr::col(product_review::Column::HelpfulVotes).add(1),
            )
            .filter(product_review::Column::Id.eq(review_id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Review", review_id));
        }

        ProductReview::find_by_id(review_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Review", review_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn unrated_products_average_zero() {
        assert_eq!(average_rating(&[]), Decimal::ZERO);
    }

    #[test]
    fn average_is_rounded() {
        assert_eq!(average_rating(&[5, 4, 4]), dec!(4.33));
        assert_eq!(average_rating(&[5, 4]), dec!(4.5));
    }

    #[test]
    fn rating_outside_one_to_five_is_rejected() {
        let input = CreateReviewInput {
            rating: 6,
            title: "Great".into(),
            comment: "Sturdy chair".into(),
        };
        assert!(input.validate().is_err());
    }
}
