//! Usage pricing integration tests for pricing-service.

mod common;

use common::{day, window, TestEngine};
use pricing_service::models::{PricePlan, PriceType, PricingSubject, UsageRecord};
use rust_decimal_macros::dec;

fn data_plan() -> PricePlan {
    PricePlan::new("pop-data", PriceType::PayPerUse)
        .with_price("EUR", dec!(2))
        .with_unit_of_measure(dec!(10), "GB")
}

fn subject() -> PricingSubject<'static> {
    PricingSubject {
        id: "prod-1",
        characteristics: &[],
    }
}

#[tokio::test]
async fn test_usage_is_priced_per_unit_of_measure() {
    let app = TestEngine::new(day(2025, 1, 31));
    app.usage
        .insert("prod-1", UsageRecord::new("u-1", day(2025, 1, 5)).with_characteristic("GB", 7.5));
    app.usage
        .insert("prod-1", UsageRecord::new("u-2", day(2025, 1, 6)).with_characteristic("Gb", 17.5));

    let outcome = app
        .engine
        .calculate_usage_price(&data_plan(), subject(), window(day(2025, 1, 1), day(2025, 1, 31)))
        .await
        .unwrap();
    assert_eq!(outcome.amount.amount(), dec!(5.00));
}

#[tokio::test]
async fn test_no_usage_prices_at_zero() {
    let app = TestEngine::new(day(2025, 1, 31));
    app.usage
        .insert("prod-1", UsageRecord::new("u-1", day(2025, 1, 5)).with_characteristic("minutes", 12));
    app.usage.insert("prod-1", UsageRecord::new("u-2", day(2025, 1, 6)));

    let outcome = app
        .engine
        .calculate_usage_price(&data_plan(), subject(), window(day(2025, 1, 1), day(2025, 1, 31)))
        .await
        .unwrap();
    assert_eq!(outcome.amount.amount(), dec!(0));
    assert_eq!(outcome.amount.currency(), "EUR");
}

#[tokio::test]
async fn test_usage_outside_window_is_ignored() {
    let app = TestEngine::new(day(2025, 2, 28));
    app.usage
        .insert("prod-1", UsageRecord::new("u-1", day(2025, 1, 31)).with_characteristic("GB", 50));
    app.usage
        .insert("prod-1", UsageRecord::new("u-2", day(2025, 2, 1)).with_characteristic("GB", 10));

    let outcome = app
        .engine
        .calculate_usage_price(&data_plan(), subject(), window(day(2025, 2, 1), day(2025, 2, 28)))
        .await
        .unwrap();
    assert_eq!(outcome.amount.amount(), dec!(2.00));
}
