//! Domain models for pricing-service.

mod charge;
mod cycle;
mod dates;
mod money;
mod price_plan;
mod product;
mod usage;

pub use charge::{
    AlterationResult, BillingLine, BillingStatement, PlanFailure, PriceOutcome, PricedComponent,
};
pub use cycle::BillCycle;
pub use dates::{far_future, far_past, parse_flexible_date, DateRange, ValidFor};
pub use money::{checked_mul, checked_mul_div, round_money, Money, MONEY_SCALE};
pub use price_plan::{
    BillingMode, CharacteristicValueScope, LifecycleStatus, PeriodUnit, PlanShape, PriceAmount,
    PricePlan, PricePlanRef, PriceType, RecurringChargePeriod, UnitOfMeasure, ValueRange,
};
pub use product::{numeric_json, Characteristic, OrderItem, PricingSubject, Product};
pub use usage::UsageRecord;
