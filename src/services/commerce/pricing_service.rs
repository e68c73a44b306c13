use crate::{
    config::AppConfig,
    entities::{order::ShippingMethod, product},
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use utoipa::ToSchema;

/// Rounds a money amount to cents, midpoint away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Current catalog price of one unit: the sale price when set.
pub fn effective_unit_price(product: &product::Model) -> Decimal {
    product.effective_price()
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Sum of `unit price x quantity` over the given lines.
pub fn subtotal<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines
        .into_iter()
        .map(|(price, qty)| line_total(price, qty))
        .sum()
}

/// Money breakdown shared by the cart view and the order pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Flat tax and per-method shipping rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub tax_rate: Decimal,
    pub standard_shipping: Decimal,
    pub express_shipping: Decimal,
    pub next_day_shipping: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: dec!(0.07),
            standard_shipping: dec!(10),
            express_shipping: dec!(25),
            next_day_shipping: Decimal::ZERO,
        }
    }
}

fn decimal_from_config(value: f64, fallback: Decimal) -> Decimal {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(4))
        .unwrap_or(fallback)
}

impl PricingPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        let defaults = Self::default();
        Self {
            tax_rate: decimal_from_config(config.tax_rate, defaults.tax_rate),
            standard_shipping: decimal_from_config(
                config.standard_shipping_rate,
                defaults.standard_shipping,
            ),
            express_shipping: decimal_from_config(
                config.express_shipping_rate,
                defaults.express_shipping,
            ),
            next_day_shipping: decimal_from_config(
                config.next_day_shipping_rate,
                defaults.next_day_shipping,
            ),
        }
    }

    /// No method selected yet means no shipping charge.
    pub fn shipping_cost(&self, method: Option<ShippingMethod>) -> Decimal {
        match method {
            Some(ShippingMethod::Standard) => self.standard_shipping,
            Some(ShippingMethod::Express) => self.express_shipping,
            Some(ShippingMethod::NextDay) => self.next_day_shipping,
            None => Decimal::ZERO,
        }
    }

    /// Tax is charged on the pre-discount subtotal.
    pub fn tax(&self, subtotal: Decimal) -> Decimal {
        round_money(subtotal * self.tax_rate)
    }

    pub fn totals(
        &self,
        subtotal: Decimal,
        discount: Decimal,
        method: Option<ShippingMethod>,
    ) -> OrderTotals {
        let subtotal = round_money(subtotal);
        let discount = round_money(discount.min(subtotal).max(Decimal::ZERO));
        let shipping = self.shipping_cost(method);
        let tax = self.tax(subtotal);
        OrderTotals {
            subtotal,
            discount,
            shipping,
            tax,
            total: subtotal - discount + shipping + tax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, dec!(0))]
    #[case(Some(ShippingMethod::Standard), dec!(10))]
    #[case(Some(ShippingMethod::Express), dec!(25))]
    #[case(Some(ShippingMethod::NextDay), dec!(0))]
    fn shipping_is_a_flat_lookup(#[case] method: Option<ShippingMethod>, #[case] expected: Decimal) {
        assert_eq!(PricingPolicy::default().shipping_cost(method), expected);
    }

    #[rstest]
    #[case(dec!(1.005), dec!(1.01))]
    #[case(dec!(-1.005), dec!(-1.01))]
    #[case(dec!(2.004), dec!(2.00))]
    fn rounding_is_midpoint_away_from_zero(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_money(input), expected);
    }

    #[test]
    fn subtotal_sums_price_times_quantity() {
        let total = subtotal([(dec!(19.99), 2), (dec!(250.00), 1)]);
        assert_eq!(total, dec!(289.98));
    }

    #[test]
    fn totals_for_standard_checkout() {
        let totals = PricingPolicy::default().totals(
            dec!(200),
            dec!(20),
            Some(ShippingMethod::Standard),
        );
        assert_eq!(totals.subtotal, dec!(200));
        assert_eq!(totals.discount, dec!(20));
        assert_eq!(totals.shipping, dec!(10));
        assert_eq!(totals.tax, dec!(14.00));
        assert_eq!(totals.total, dec!(204.00));
    }

    #[test]
    fn discount_never_exceeds_subtotal() {
        let totals = PricingPolicy::default().totals(dec!(30), dec!(50), None);
        assert_eq!(totals.discount, dec!(30));
        assert_eq!(totals.total, dec!(2.10));
    }

    #[test]
    fn tax_rounds_to_cents() {
        assert_eq!(PricingPolicy::default().tax(dec!(19.99)), dec!(1.40));
    }

    #[test]
    fn policy_reads_configured_rates() {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            0,
            "development".into(),
        );
        cfg.tax_rate = 0.0825;
        cfg.next_day_shipping_rate = 40.0;

        let policy = PricingPolicy::from_config(&cfg);
        assert_eq!(policy.tax_rate, dec!(0.0825));
        assert_eq!(policy.next_day_shipping, dec!(40));
        assert_eq!(policy.standard_shipping, dec!(10));
    }
}
