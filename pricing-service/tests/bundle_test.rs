//! Bundle pricing integration tests for pricing-service.

mod common;

use common::{day, TestEngine};
use pricing_service::error::PricingError;
use pricing_service::models::{
    Characteristic, CharacteristicValueScope, Money, OrderItem, PlanShape, PricePlan, PriceType,
};
use rust_decimal_macros::dec;

fn speed_tier(id: &str, speed: i64, price: rust_decimal::Decimal) -> PricePlan {
    PricePlan::new(id, PriceType::OneTime)
        .with_price("EUR", price)
        .with_scope(CharacteristicValueScope::new("speed").with_value(speed))
}

fn per_mbps(id: &str) -> PricePlan {
    PricePlan::new(id, PriceType::OneTime)
        .with_price("EUR", dec!(0.50))
        .with_unit_of_measure(dec!(10), "Mbps")
        .with_scope(CharacteristicValueScope::new("speed"))
}

fn app() -> TestEngine {
    TestEngine::new(day(2025, 6, 1)).with_plans([
        PricePlan::new("pop-modem", PriceType::OneTime).with_price("EUR", dec!(9.99)),
        PricePlan::new("pop-install", PriceType::OneTime).with_price("EUR", dec!(25.005)),
        speed_tier("pop-100", 100, dec!(30)),
        speed_tier("pop-200", 200, dec!(45)),
        per_mbps("pop-per-mbps"),
        per_mbps("pop-per-mbps-b"),
        PricePlan::new("pop-welcome", PriceType::Discount).with_price("EUR", dec!(5)),
    ])
}

fn characteristics(speed: i64) -> Vec<Characteristic> {
    vec![Characteristic::new("speed", speed)]
}

#[tokio::test]
async fn test_bundle_total_is_sum_of_members() {
    let app = app();
    let bundle = PricePlan::new("pop-pack", PriceType::OneTime)
        .bundle_of(["pop-modem", "pop-install", "pop-100", "pop-200"]);
    let characteristics = characteristics(200);
    let subject = pricing_service::models::PricingSubject {
        id: "prod-1",
        characteristics: &characteristics,
    };

    let outcome = app
        .engine
        .calculate_bundle_price(&bundle, subject, None)
        .await
        .unwrap();

    let ids: Vec<_> = outcome.components.iter().map(|c| c.plan_id.as_str()).collect();
    assert_eq!(ids, vec!["pop-modem", "pop-install", "pop-200"]);

    let summed = Money::sum("EUR", outcome.components.iter().map(|c| &c.amount)).unwrap();
    assert_eq!(outcome.amount, summed);
    // 9.99 + 25.00 (25.005 rounds half to even) + 45
    assert_eq!(outcome.amount.amount(), dec!(79.99));
}

#[tokio::test]
async fn test_perfect_match_wins_over_candidates() {
    let app = app();
    let bundle = PricePlan::new("pop-pack", PriceType::OneTime)
        .bundle_of(["pop-per-mbps", "pop-per-mbps-b", "pop-100"]);
    let characteristics = characteristics(100);
    let subject = pricing_service::models::PricingSubject {
        id: "prod-1",
        characteristics: &characteristics,
    };

    let outcome = app
        .engine
        .calculate_bundle_price(&bundle, subject, None)
        .await
        .unwrap();
    assert_eq!(outcome.components.len(), 1);
    assert_eq!(outcome.components[0].plan_id, "pop-100");
    assert_eq!(outcome.components[0].shape, PlanShape::Characteristic);
    assert_eq!(outcome.amount.amount(), dec!(30));
}

#[tokio::test]
async fn test_single_candidate_is_priced_per_unit() {
    let app = app();
    let bundle = PricePlan::new("pop-pack", PriceType::OneTime)
        .bundle_of(["pop-100", "pop-200", "pop-per-mbps"]);
    let characteristics = characteristics(150);
    let subject = pricing_service::models::PricingSubject {
        id: "prod-1",
        characteristics: &characteristics,
    };

    let outcome = app
        .engine
        .calculate_bundle_price(&bundle, subject, None)
        .await
        .unwrap();
    assert_eq!(outcome.components.len(), 1);
    assert_eq!(outcome.components[0].plan_id, "pop-per-mbps");
    // 0.50 × 150 / 10
    assert_eq!(outcome.amount.amount(), dec!(7.50));
}

#[tokio::test]
async fn test_ambiguous_members_fail_validation() {
    let app = app();
    let bundle = PricePlan::new("pop-pack", PriceType::OneTime)
        .bundle_of(["pop-per-mbps", "pop-per-mbps-b"]);
    let item = OrderItem::new("oi-1").with_characteristic("speed", 70);

    let err = app
        .engine
        .calculate_order_preview_price(&item, &bundle, None)
        .await
        .unwrap_err();
    match err {
        PricingError::Validation(issues) => {
            let message = issues.to_string();
            assert!(message.contains("pop-per-mbps"));
            assert!(message.contains("pop-per-mbps-b"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unmatched_scoped_members_are_skipped() {
    let app = app();
    let bundle = PricePlan::new("pop-pack", PriceType::OneTime)
        .bundle_of(["pop-modem", "pop-100", "pop-200"]);
    let item = OrderItem::new("oi-1").with_characteristic("speed", 300);

    let components = app
        .engine
        .calculate_order_preview_price(&item, &bundle, None)
        .await
        .unwrap();
    let ids: Vec<_> = components.iter().map(|c| c.plan_id.as_str()).collect();
    assert_eq!(ids, vec!["pop-modem"]);
}

#[tokio::test]
async fn test_empty_bundle_fails_before_fetching() {
    let app = app();
    let mut bundle = PricePlan::new("pop-empty", PriceType::OneTime);
    bundle.is_bundle = true;
    let subject = pricing_service::models::PricingSubject {
        id: "prod-1",
        characteristics: &[],
    };

    let err = app
        .engine
        .calculate_bundle_price(&bundle, subject, None)
        .await
        .unwrap_err();
    assert!(matches!(err, PricingError::Configuration(_)));
    assert_eq!(app.catalog.fetch_count(), 0);
}

#[tokio::test]
async fn test_bundle_level_discount_applies_to_total() {
    let app = app();
    let bundle = PricePlan::new("pop-pack", PriceType::OneTime)
        .bundle_of(["pop-modem", "pop-100"])
        .with_alterations(["pop-welcome"]);
    let item = OrderItem::new("oi-1").with_characteristic("speed", 100);
    let characteristics = item.characteristics.clone();
    let subject = pricing_service::models::PricingSubject {
        id: "oi-1",
        characteristics: &characteristics,
    };

    let outcome = app
        .engine
        .calculate_bundle_price(&bundle, subject, None)
        .await
        .unwrap();
    assert_eq!(outcome.base_amount.amount(), dec!(39.99));
    assert_eq!(outcome.amount.amount(), dec!(34.99));
    assert!(outcome.is_altered());
}

#[tokio::test]
async fn test_nested_bundles_are_priced_recursively() {
    let app = app();
    app.catalog.insert(
        PricePlan::new("pop-inner", PriceType::OneTime).bundle_of(["pop-modem", "pop-install"]),
    );
    let outer = PricePlan::new("pop-outer", PriceType::OneTime).bundle_of(["pop-inner", "pop-200"]);
    let item = OrderItem::new("oi-1").with_characteristic("speed", 200);

    let components = app
        .engine
        .calculate_order_preview_price(&item, &outer, None)
        .await
        .unwrap();
    assert_eq!(components[0].plan_id, "pop-inner");
    assert_eq!(components[0].shape, PlanShape::Bundled);
    assert_eq!(components[0].amount.amount(), dec!(34.99));
    assert_eq!(components[1].amount.amount(), dec!(45));
}
