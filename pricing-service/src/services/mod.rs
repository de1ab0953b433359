//! Services module for pricing-service.

pub mod alteration;
pub mod bill_cycle;
pub mod calculators;
pub mod engine;
pub mod matcher;
pub mod metrics;
pub mod usage_aggregator;
pub mod validation;

pub use alteration::{apply_alterations, apply_alterations_with_quantity, AlterationKind, AlterationSummary};
pub use bill_cycle::{
    bill_cycles, bill_cycles_in_window, bill_dates, billing_horizon, billing_periods,
    period_end_dates,
};
pub use calculators::{select_calculator, CalculationEnv, Calculator, PlanContext, PriceCalculator};
pub use engine::{PricingEngine, PricingSettings};
pub use matcher::{match_price_plan, scoped_plans, MatchResult, ScopedPlan};
pub use metrics::{
    get_metrics, init_metrics, record_alteration_applied, record_calculation,
    record_calculation_duration, record_error, record_fetch_duration,
};
pub use usage_aggregator::{UsageEntry, UsageIndex};
pub use validation::{validate_price_plan, validate_product, validate_usage_record};
