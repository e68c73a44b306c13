//! Property-based tests for pricing and promotion selection.

use backyard_api::{
    entities::commerce::{DiscountType, PromotionModel},
    entities::order::ShippingMethod,
    services::{
        commerce::{
            pricing_service::{line_total, round_money, subtotal},
            product_catalog_service::slugify,
            PricingPolicy,
        },
        promotions::{discount_for, normalize_code, select_best_promotion},
    },
};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

fn money_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..5_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn shipping_strategy() -> impl Strategy<Value = Option<ShippingMethod>> {
    prop_oneof![
        Just(None),
        Just(Some(ShippingMethod::Standard)),
        Just(Some(ShippingMethod::Express)),
        Just(Some(ShippingMethod::NextDay)),
    ]
}

#[derive(Debug, Clone)]
struct PromoSpec {
    percentage: bool,
    value_cents: i64,
    minimum_cents: i64,
    active: bool,
    limit: i32,
    used: i32,
    expired: bool,
}

fn promo_strategy() -> impl Strategy<Value = PromoSpec> {
    (
        any::<bool>(),
        1i64..20_000,
        0i64..100_000,
        prop::bool::weighted(0.8),
        0i32..4,
        0i32..4,
        prop::bool::weighted(0.2),
    )
        .prop_map(
            |(percentage, value_cents, minimum_cents, active, limit, used, expired)| PromoSpec {
                percentage,
                // percentages stay within 0.01..=100
                value_cents: if percentage { value_cents % 10_000 + 1 } else { value_cents },
                minimum_cents,
                active,
                limit,
                used,
                expired,
            },
        )
}

fn promotion(spec: &PromoSpec, index: usize) -> PromotionModel {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(index as i64);
    let now = Utc::now();
    let (start_date, end_date) = if spec.expired {
        (now - Duration::days(30), now - Duration::days(1))
    } else {
        (now - Duration::days(1), now + Duration::days(30))
    };
    PromotionModel {
        id: Uuid::new_v4(),
        name: format!("promo-{}", index),
        description: String::new(),
        discount_type: if spec.percentage {
            DiscountType::Percentage
        } else {
            DiscountType::Fixed
        },
        discount_value: Decimal::new(spec.value_cents, 2),
        code: None,
        start_date,
        end_date,
        is_active: spec.active,
        minimum_order_value: Decimal::new(spec.minimum_cents, 2),
        usage_limit: spec.limit,
        used_count: spec.used,
        created_at: created,
        updated_at: created,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn discount_never_exceeds_subtotal(spec in promo_strategy(), sub in money_strategy()) {
        let discount = discount_for(&promotion(&spec, 0), sub);
        prop_assert!(discount >= Decimal::ZERO);
        prop_assert!(discount <= sub, "discount {} above subtotal {}", discount, sub);
        prop_assert_eq!(discount, round_money(discount));
    }

    #[test]
    fn best_promotion_is_the_largest_valid_one(
        specs in prop::collection::vec(promo_strategy(), 0..6),
        sub in money_strategy(),
    ) {
        let now = Utc::now();
        let promotions: Vec<PromotionModel> =
            specs.iter().enumerate().map(|(i, s)| promotion(s, i)).collect();

        let eligible: Vec<&PromotionModel> = promotions
            .iter()
            .filter(|p| p.is_valid_at(now) && sub >= p.minimum_order_value)
            .collect();
        let best_available = eligible
            .iter()
            .map(|p| discount_for(p, sub))
            .max()
            .unwrap_or(Decimal::ZERO);

        match select_best_promotion(&promotions, sub, now) {
            Some(applied) => {
                prop_assert!(applied.promotion.is_valid_at(now));
                prop_assert!(!applied.promotion.is_exhausted());
                prop_assert!(sub >= applied.promotion.minimum_order_value);
                prop_assert_eq!(applied.discount, best_available);
                prop_assert!(applied.discount > Decimal::ZERO);
            }
            None => prop_assert_eq!(best_available, Decimal::ZERO),
        }
    }

    #[test]
    fn totals_add_up(
        sub in money_strategy(),
        discount in money_strategy(),
        method in shipping_strategy(),
    ) {
        let totals = PricingPolicy::default().totals(sub, discount, method);
        prop_assert!(totals.discount <= totals.subtotal);
        prop_assert_eq!(
            totals.total,
            totals.subtotal - totals.discount + totals.shipping + totals.tax
        );
        prop_assert!(totals.total >= totals.shipping + totals.tax);
        prop_assert_eq!(totals.tax, round_money(totals.subtotal * Decimal::new(7, 2)));
    }

    #[test]
    fn subtotal_is_the_sum_of_line_totals(
        lines in prop::collection::vec((money_strategy(), 1i32..20), 0..10),
    ) {
        let expected: Decimal = lines.iter().map(|(p, q)| line_total(*p, *q)).sum();
        prop_assert_eq!(subtotal(lines.clone()), expected);
        for (price, qty) in lines {
            prop_assert_eq!(line_total(price, qty), price * Decimal::from(qty));
        }
    }

    #[test]
    fn slugs_are_url_safe(name in "[ -~]{0,40}") {
        let slug = slugify(&name);
        prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
    }

    #[test]
    fn codes_normalise_idempotently(code in "[ a-zA-Z0-9]{0,20}") {
        let once = normalize_code(&code);
        prop_assert_eq!(normalize_code(&once), once.clone());
        prop_assert_eq!(once.to_uppercase(), once);
    }
}
