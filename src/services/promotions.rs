use crate::{
    entities::commerce::{promotion, DiscountType, Promotion, PromotionModel},
    errors::ServiceError,
    services::commerce::pricing_service::round_money,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    sea_query::{Condition, Expr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Discount a promotion grants on `subtotal`, capped at the subtotal.
pub fn discount_for(promotion: &PromotionModel, subtotal: Decimal) -> Decimal {
    let raw = match promotion.discount_type {
        DiscountType::Percentage => subtotal * promotion.discount_value / dec!(100),
        DiscountType::Fixed => promotion.discount_value,
    };
    round_money(raw.min(subtotal).max(Decimal::ZERO))
}

/// Valid right now and the order is large enough.
pub fn is_candidate(promotion: &PromotionModel, subtotal: Decimal, now: DateTime<Utc>) -> bool {
    promotion.is_valid_at(now) && subtotal >= promotion.minimum_order_value
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPromotion {
    pub promotion: PromotionModel,
    pub discount: Decimal,
}

/// Picks the candidate with the largest discount. Candidates are visited in
/// the given order and only a strictly larger discount replaces the current
/// pick, so ties keep the first one seen. A zero discount is never applied.
pub fn select_best_promotion(
    promotions: &[PromotionModel],
    subtotal: Decimal,
    now: DateTime<Utc>,
) -> Option<AppliedPromotion> {
    let mut best: Option<AppliedPromotion> = None;
    let mut best_discount = Decimal::ZERO;

    for promotion in promotions
        .iter()
        .filter(|p| is_candidate(p, subtotal, now))
    {
        let discount = discount_for(promotion, subtotal);
        if discount > best_discount {
            best_discount = discount;
            best = Some(AppliedPromotion {
                promotion: promotion.clone(),
                discount,
            });
        }
    }

    best
}

/// Canonical form of a promotion code
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn sort_for_evaluation(promotions: &mut [PromotionModel]) {
    promotions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

/// Summary of the promotion applied to a cart or order
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppliedPromotionView {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub discount_type: DiscountType,
    pub discount: Decimal,
}

impl From<&AppliedPromotion> for AppliedPromotionView {
    fn from(applied: &AppliedPromotion) -> Self {
        Self {
            id: applied.promotion.id,
            name: applied.promotion.name.clone(),
            code: applied.promotion.code.clone(),
            discount_type: applied.promotion.discount_type,
            discount: applied.discount,
        }
    }
}

#[derive(Clone)]
pub struct PromotionService {
    db: Arc<DatabaseConnection>,
}

impl PromotionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Active promotions in evaluation order (`created_at`, then `id`).
    pub async fn active_promotions<C>(&self, conn: &C) -> Result<Vec<PromotionModel>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let mut promotions = Promotion::find()
            .filter(promotion::Column::IsActive.eq(true))
            .all(conn)
            .await?;
        sort_for_evaluation(&mut promotions);
        Ok(promotions)
    }

    /// Best automatic promotion for `subtotal`, if any applies.
    pub async fn best_for_subtotal<C>(
        &self,
        conn: &C,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Option<AppliedPromotion>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let promotions = self.active_promotions(conn).await?;
        let best = select_best_promotion(&promotions, subtotal, now);
        debug!(
            subtotal = %subtotal,
            promotion = ?best.as_ref().map(|b| b.promotion.id),
            "Evaluated promotions"
        );
        Ok(best)
    }

    /// Resolves an explicit promotion code. Unknown, expired, exhausted or
    /// below-minimum codes are rejected.
    pub async fn apply_code<C>(
        &self,
        conn: &C,
        code: &str,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> Result<AppliedPromotion, ServiceError>
    where
        C: ConnectionTrait,
    {
        let code = normalize_code(code);
        let promotion = Promotion::find()
            .filter(promotion::Column::Code.eq(code.clone()))
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Promotion code {} is not valid", code))
            })?;

        if !promotion.is_valid_at(now) {
            warn!(%code, "Rejected promotion code outside its validity window or usage limit");
            return Err(ServiceError::ValidationError(format!(
                "Promotion code {} is not valid",
                code
            )));
        }

        if subtotal < promotion.minimum_order_value {
            return Err(ServiceError::ValidationError(format!(
                "Promotion code {} requires a minimum order of {}",
                code,
                round_money(promotion.minimum_order_value)
            )));
        }

        let discount = discount_for(&promotion, subtotal);
        Ok(AppliedPromotion {
            promotion,
            discount,
        })
    }

    /// Explicit code when given, best automatic promotion otherwise.
    pub async fn resolve<C>(
        &self,
        conn: &C,
        code: Option<&str>,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Option<AppliedPromotion>, ServiceError>
    where
        C: ConnectionTrait,
    {
        match code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => self.apply_code(conn, code, subtotal, now).await.map(Some),
            None => self.best_for_subtotal(conn, subtotal, now).await,
        }
    }

    /// Consumes one use of a promotion. The increment is conditional on the
    /// limit so two concurrent checkouts cannot both take the last use.
    pub async fn record_usage<C>(&self, conn: &C, promotion_id: Uuid) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        let result = Promotion::update_many()
            .col_expr(
                promotion::Column::UsedCount,
                Expr::col(promotion::Column::UsedCount).add(1),
            )
            .col_expr(promotion::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(promotion::Column::Id.eq(promotion_id))
            .filter(
                Condition::any()
                    .add(promotion::Column::UsageLimit.eq(0))
                    .add(
                        Expr::col(promotion::Column::UsedCount)
                            .lt(Expr::col(promotion::Column::UsageLimit)),
                    ),
            )
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::ValidationError(
                "Promotion usage limit has been reached".to_string(),
            ));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn create_promotion(
        &self,
        input: CreatePromotionInput,
    ) -> Result<PromotionModel, ServiceError> {
        input.validate()?;
        input.check_consistency()?;

        let code = input
            .code
            .as_deref()
            .map(normalize_code)
            .filter(|c| !c.is_empty());
        if let Some(code) = &code {
            let existing = Promotion::find()
                .filter(promotion::Column::Code.eq(code.clone()))
                .one(&*self.db)
                .await?;
            if existing.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "Promotion code {} already exists",
                    code
                )));
            }
        }

        let now = Utc::now();
        let model = promotion::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description.unwrap_or_default()),
            discount_type: Set(input.discount_type),
            discount_value: Set(input.discount_value),
            code: Set(code),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            is_active: Set(input.is_active.unwrap_or(true)),
            minimum_order_value: Set(input.minimum_order_value.unwrap_or(Decimal::ZERO)),
            usage_limit: Set(input.usage_limit.unwrap_or(0)),
            used_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!("Created promotion {}", model.id);
        Ok(model)
    }

    pub async fn list_promotions(&self) -> Result<Vec<PromotionModel>, ServiceError> {
        let mut promotions = Promotion::find().all(&*self.db).await?;
        sort_for_evaluation(&mut promotions);
        Ok(promotions)
    }

    /// Promotions running at `now`, earliest created first.
    pub async fn current_promotions(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<PromotionModel>, ServiceError> {
        Ok(self
            .active_promotions(&*self.db)
            .await?
            .into_iter()
            .filter(|p| p.is_valid_at(now))
            .take(limit)
            .collect())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreatePromotionInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[validate(length(max = 50))]
    pub code: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: Option<bool>,
    pub minimum_order_value: Option<Decimal>,
    #[validate(range(min = 0))]
    pub usage_limit: Option<i32>,
}

impl CreatePromotionInput {
    fn check_consistency(&self) -> Result<(), ServiceError> {
        if self.discount_value <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "discount_value must be greater than zero".into(),
            ));
        }
        if self.discount_type == DiscountType::Percentage && self.discount_value > dec!(100) {
            return Err(ServiceError::ValidationError(
                "percentage discounts cannot exceed 100".into(),
            ));
        }
        if self.end_date <= self.start_date {
            return Err(ServiceError::ValidationError(
                "end_date must be after start_date".into(),
            ));
        }
        if self
            .minimum_order_value
            .map_or(false, |m| m < Decimal::ZERO)
        {
            return Err(ServiceError::ValidationError(
                "minimum_order_value cannot be negative".into(),
            ));
        }
        Ok(())
    }
}
