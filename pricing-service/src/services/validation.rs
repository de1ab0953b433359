//! Required-field checks gating the calculations.

use crate::error::{PricingError, ValidationIssues};
use crate::models::{PricePlan, PriceType, Product, UsageRecord};

pub fn validate_product(product: &Product) -> Result<(), PricingError> {
    let mut issues = ValidationIssues::new();

    if product.id.trim().is_empty() {
        issues.error("id", "product id is required");
    }
    if product.start_date.is_none() {
        issues.error("startDate", "product start date is required");
    }
    if product.product_prices.is_empty() {
        issues.error("productPrice", "product has no price plan references");
    }
    for (i, characteristic) in product.characteristics.iter().enumerate() {
        if characteristic.name.trim().is_empty() {
            issues.warning(
                format!("characteristics[{}].name", i),
                "characteristic has an empty name and is ignored",
            );
        }
    }

    issues.into_result("product", &product.id)
}

/// Check a plan before pricing it.
///
/// A missing currency is a warning only; calculators fall back to `default_currency`.
pub fn validate_price_plan(plan: &PricePlan, default_currency: &str) -> Result<(), PricingError> {
    let mut issues = ValidationIssues::new();

    if plan.id.trim().is_empty() {
        issues.error("id", "price plan id is required");
    }
    if plan.lifecycle_status.is_none() {
        issues.error("lifecycleStatus", "lifecycle status is required");
    }

    let percentage_discount = plan.price_type == PriceType::Discount && plan.percentage.is_some();
    if !plan.is_bundle && !percentage_discount {
        if plan.price_value().is_none() {
            issues.error("price.value", "price value is required");
        } else if plan.price_unit().is_none() {
            issues.warning(
                "price.unit",
                format!("price currency is missing, defaulting to {}", default_currency),
            );
        }
    }

    issues.into_result("price_plan", &plan.id)
}

/// Usage records never fail validation; gaps are only reported.
pub fn validate_usage_record(record: &UsageRecord) -> Result<(), PricingError> {
    let mut issues = ValidationIssues::new();

    if record.characteristics.is_empty() {
        issues.warning("characteristics", "usage record has no characteristics");
    }
    if record.usage_date.is_none() {
        issues.warning("usageDate", "usage record has no usage date");
    }

    issues.into_result("usage_record", &record.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillingMode, LifecycleStatus};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_issues_are_accumulated() {
        let product = Product {
            id: String::new(),
            name: None,
            start_date: None,
            status: None,
            characteristics: Vec::new(),
            product_prices: Vec::new(),
            billing_account_id: None,
            related_party_ids: Vec::new(),
        };
        match validate_product(&product).unwrap_err() {
            PricingError::Validation(issues) => assert_eq!(issues.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_characteristic_name_is_only_a_warning() {
        let product = Product::new("p-1", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .with_characteristic(" ", 5)
            .with_prices(["pop-1"]);
        assert!(validate_product(&product).is_ok());
    }

    #[test]
    fn test_plan_requires_lifecycle_and_price() {
        let mut plan = PricePlan::new("pop-1", PriceType::Recurring(BillingMode::Postpaid));
        plan.lifecycle_status = None;
        match validate_price_plan(&plan, "EUR").unwrap_err() {
            PricingError::Validation(issues) => {
                let fields: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
                assert_eq!(fields, vec!["lifecycleStatus", "price.value"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_currency_and_exempt_plans_pass() {
        let mut no_unit = PricePlan::new("pop-1", PriceType::OneTime).with_price("EUR", dec!(5));
        if let Some(price) = no_unit.price.as_mut() {
            price.unit = None;
        }
        assert!(validate_price_plan(&no_unit, "EUR").is_ok());

        let percentage = PricePlan::new("d", PriceType::Discount).with_percentage(dec!(10));
        assert!(validate_price_plan(&percentage, "EUR").is_ok());

        let bundle = PricePlan::new("b", PriceType::OneTime)
            .bundle_of(["m"])
            .with_lifecycle(LifecycleStatus::Launched);
        assert!(validate_price_plan(&bundle, "EUR").is_ok());
    }

    #[test]
    fn test_usage_record_without_characteristics_passes() {
        let record = UsageRecord::new("u-1", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(validate_usage_record(&record).is_ok());
    }
}
