//! Applies alteration (discount) plans on top of a base amount.

use crate::error::PricingError;
use crate::models::{
    checked_mul, checked_mul_div, round_money, AlterationResult, Money, PricePlan, PriceType,
};
use crate::services::metrics::record_alteration_applied;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Supported alteration kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterationKind {
    Discount,
}

impl AlterationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlterationKind::Discount => "discount",
        }
    }

    pub fn for_plan(plan: &PricePlan) -> Result<Self, PricingError> {
        match &plan.price_type {
            PriceType::Discount => Ok(AlterationKind::Discount),
            other => Err(PricingError::Configuration(format!(
                "unsupported alteration type {} on price plan {}",
                other, plan.id
            ))),
        }
    }
}

/// Alteration results plus the overall altered amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterationSummary {
    pub results: Vec<AlterationResult>,
    pub altered_amount: Money,
}

/// Apply `plans` in declaration order to `base`.
pub fn apply_alterations(
    base: &Money,
    plans: &[PricePlan],
    as_of: NaiveDate,
) -> Result<AlterationSummary, PricingError> {
    apply_alterations_with_quantity(base, Decimal::ONE, plans, as_of)
}

/// Apply `plans` to `unit_price × quantity`; flat discounts scale with the quantity.
///
/// Every adjustment is computed against the unaltered base and clamped so that
/// neither a single result nor the overall amount goes below zero.
pub fn apply_alterations_with_quantity(
    unit_price: &Money,
    quantity: Decimal,
    plans: &[PricePlan],
    as_of: NaiveDate,
) -> Result<AlterationSummary, PricingError> {
    let base = unit_price.times(quantity)?.rounded();
    let mut results = Vec::with_capacity(plans.len());
    let mut total_adjustment = base.zero_like();

    for plan in plans {
        if !plan.is_active() || !plan.is_valid_on(as_of) {
            tracing::debug!(
                plan_id = %plan.id,
                as_of = %as_of,
                "Skipping inactive or out-of-validity alteration"
            );
            continue;
        }

        let kind = AlterationKind::for_plan(plan)?;
        let raw = match plan.percentage {
            Some(percentage) => {
                -round_money(checked_mul_div(base.amount(), percentage, Decimal::ONE_HUNDRED)?)
            }
            None => {
                let value = plan.price_value().ok_or_else(|| {
                    PricingError::validation(
                        "price.value",
                        format!("discount plan {} has neither percentage nor value", plan.id),
                    )
                })?;
                if let Some(unit) = plan.price_unit() {
                    if !unit.eq_ignore_ascii_case(base.currency()) {
                        return Err(PricingError::validation(
                            "price.unit",
                            format!(
                                "discount plan {} is in {} but the base is in {}",
                                plan.id,
                                unit,
                                base.currency()
                            ),
                        ));
                    }
                }
                -round_money(checked_mul(value.abs(), quantity)?)
            }
        };

        // Never push the result below zero
        let adjustment = base.with_amount(raw.max(-base.amount()));
        let resulting_amount = base.checked_add(&adjustment)?;
        total_adjustment = total_adjustment.checked_add(&adjustment)?;

        tracing::debug!(
            plan_id = %plan.id,
            kind = kind.as_str(),
            adjustment = %adjustment,
            resulting_amount = %resulting_amount,
            "Alteration applied"
        );
        record_alteration_applied(kind.as_str());

        results.push(AlterationResult {
            source_plan_id: plan.id.clone(),
            adjustment,
            resulting_amount,
        });
    }

    let altered_amount = base.checked_add(&total_adjustment)?.non_negative().rounded();
    Ok(AlterationSummary {
        results,
        altered_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LifecycleStatus;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn eur(amount: Decimal) -> Money {
        Money::new("EUR", amount).unwrap()
    }

    fn percent_off(id: &str, pct: Decimal) -> PricePlan {
        PricePlan::new(id, PriceType::Discount).with_percentage(pct)
    }

    fn flat_off(id: &str, value: Decimal) -> PricePlan {
        PricePlan::new(id, PriceType::Discount).with_price("EUR", value)
    }

    #[test]
    fn test_percentage_discount_rounds_half_even() {
        let summary = apply_alterations(&eur(dec!(10.25)), &[percent_off("d", dec!(10))], day()).unwrap();
        // 1.025 rounds to 1.02
        assert_eq!(summary.results[0].adjustment.amount(), dec!(-1.02));
        assert_eq!(summary.altered_amount.amount(), dec!(9.23));
    }

    #[test]
    fn test_discounts_are_independent_of_each_other() {
        let plans = vec![percent_off("a", dec!(50)), percent_off("b", dec!(50))];
        let summary = apply_alterations(&eur(dec!(100)), &plans, day()).unwrap();
        assert_eq!(summary.results[0].resulting_amount.amount(), dec!(50));
        assert_eq!(summary.results[1].resulting_amount.amount(), dec!(50));
        assert_eq!(summary.altered_amount.amount(), dec!(0));
    }

    #[test]
    fn test_flat_discount_is_clamped_at_zero() {
        let summary = apply_alterations(&eur(dec!(5)), &[flat_off("d", dec!(8))], day()).unwrap();
        assert_eq!(summary.results[0].adjustment.amount(), dec!(-5));
        assert_eq!(summary.results[0].resulting_amount.amount(), dec!(0));
        assert!(!summary.altered_amount.is_negative());
    }

    #[test]
    fn test_flat_discount_scales_with_quantity() {
        let summary =
            apply_alterations_with_quantity(&eur(dec!(20)), dec!(3), &[flat_off("d", dec!(2))], day())
                .unwrap();
        assert_eq!(summary.results[0].adjustment.amount(), dec!(-6));
        assert_eq!(summary.altered_amount.amount(), dec!(54));
    }

    #[test]
    fn test_inactive_plans_are_skipped() {
        let retired = percent_off("old", dec!(50)).with_lifecycle(LifecycleStatus::Retired);
        let summary = apply_alterations(&eur(dec!(40)), &[retired], day()).unwrap();
        assert!(summary.results.is_empty());
        assert_eq!(summary.altered_amount.amount(), dec!(40));
    }

    #[test]
    fn test_non_discount_alteration_is_configuration_error() {
        let surcharge = PricePlan::new("s", PriceType::OneTime).with_price("EUR", dec!(1));
        let err = apply_alterations(&eur(dec!(10)), &[surcharge], day()).unwrap_err();
        assert!(matches!(err, PricingError::Configuration(_)));
    }

    #[test]
    fn test_discount_without_value_is_validation_error() {
        let empty = PricePlan::new("d", PriceType::Discount);
        let err = apply_alterations(&eur(dec!(10)), &[empty], day()).unwrap_err();
        assert!(matches!(err, PricingError::Validation(_)));
    }
}
