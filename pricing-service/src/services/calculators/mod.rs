//! Price calculators, one per plan shape, and the factory selecting between them.

mod base;
mod bundle;
mod characteristic;
mod usage;

use crate::clients::{CatalogClient, UsageClient};
use crate::error::PricingError;
use crate::models::{
    DateRange, Money, PlanShape, PriceOutcome, PricePlan, PriceType, PricedComponent,
    PricingSubject, UsageRecord,
};
use crate::services::alteration::apply_alterations_with_quantity;
use crate::services::metrics::{record_calculation, record_calculation_duration, record_error};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::time::Instant;

pub use base::BaseCalculator;
pub use bundle::BundleCalculator;
pub use characteristic::CharacteristicCalculator;
pub use usage::UsageCalculator;

/// Inputs of one plan calculation.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub plan: &'a PricePlan,
    pub subject: PricingSubject<'a>,
    pub quantity: Decimal,
    /// Billing period or preview window; required for usage plans.
    pub window: Option<DateRange>,
    /// Usage to price instead of fetching it, for previews.
    pub simulated_usage: Option<&'a [UsageRecord]>,
    pub as_of: NaiveDate,
}

impl<'a> PlanContext<'a> {
    pub fn new(plan: &'a PricePlan, subject: PricingSubject<'a>, as_of: NaiveDate) -> Self {
        Self {
            plan,
            subject,
            quantity: Decimal::ONE,
            window: None,
            simulated_usage: None,
            as_of,
        }
    }

    pub fn with_quantity(self, quantity: Decimal) -> Self {
        Self { quantity, ..self }
    }

    pub fn with_window(self, window: Option<DateRange>) -> Self {
        Self { window, ..self }
    }

    pub fn with_simulated_usage(self, usage: Option<&'a [UsageRecord]>) -> Self {
        Self {
            simulated_usage: usage,
            ..self
        }
    }

    /// Same inputs, another plan; used for bundle members.
    pub fn for_plan<'b>(&self, plan: &'b PricePlan) -> PlanContext<'b>
    where
        'a: 'b,
    {
        PlanContext {
            plan,
            subject: self.subject,
            quantity: self.quantity,
            window: self.window,
            simulated_usage: self.simulated_usage,
            as_of: self.as_of,
        }
    }
}

/// Collaborators and defaults shared by every calculation of a request.
#[derive(Clone, Copy)]
pub struct CalculationEnv<'a> {
    pub catalog: &'a dyn CatalogClient,
    pub usage: &'a dyn UsageClient,
    pub default_currency: &'a str,
}

#[async_trait]
pub trait PriceCalculator: Send + Sync {
    async fn calculate_price(
        &self,
        ctx: &PlanContext<'_>,
        env: &CalculationEnv<'_>,
    ) -> Result<PriceOutcome, PricingError>;
}

/// Calculator chosen for a plan shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Calculator {
    Base(BaseCalculator),
    Characteristic(CharacteristicCalculator),
    Usage(UsageCalculator),
    Bundled(BundleCalculator),
}

impl Calculator {
    pub fn shape(&self) -> PlanShape {
        match self {
            Calculator::Base(_) => PlanShape::Flat,
            Calculator::Characteristic(_) => PlanShape::Characteristic,
            Calculator::Usage(_) => PlanShape::Usage,
            Calculator::Bundled(_) => PlanShape::Bundled,
        }
    }
}

#[async_trait]
impl PriceCalculator for Calculator {
    async fn calculate_price(
        &self,
        ctx: &PlanContext<'_>,
        env: &CalculationEnv<'_>,
    ) -> Result<PriceOutcome, PricingError> {
        let shape = self.shape().as_str();
        let started = Instant::now();

        let result = match self {
            Calculator::Base(c) => c.calculate_price(ctx, env).await,
            Calculator::Characteristic(c) => c.calculate_price(ctx, env).await,
            Calculator::Usage(c) => c.calculate_price(ctx, env).await,
            Calculator::Bundled(c) => c.calculate_price(ctx, env).await,
        };

        record_calculation_duration(shape, started.elapsed().as_secs_f64());
        match &result {
            Ok(outcome) => {
                record_calculation(shape, "success");
                tracing::debug!(
                    plan_id = %ctx.plan.id,
                    shape,
                    base_amount = %outcome.base_amount,
                    amount = %outcome.amount,
                    "Price calculated"
                );
            }
            Err(e) => {
                record_calculation(shape, "failure");
                record_error(e.kind(), shape);
            }
        }
        result
    }
}

/// Pick the calculator for `plan`. Bundling takes precedence over usage, which
/// takes precedence over characteristic scopes.
///
/// Discount plans only apply as alterations and cannot be priced on their own.
pub fn select_calculator(
    plan: &PricePlan,
    subject: &PricingSubject<'_>,
    window: Option<DateRange>,
) -> Result<Calculator, PricingError> {
    match &plan.price_type {
        PriceType::Discount => {
            return Err(PricingError::BadRequest(format!(
                "price plan {} is a discount and only applies as an alteration",
                plan.id
            )));
        }
        PriceType::Other(price_type) => {
            return Err(PricingError::Configuration(format!(
                "price plan {} has unsupported price type {}",
                plan.id, price_type
            )));
        }
        _ => {}
    }

    match plan.shape() {
        PlanShape::Bundled => Ok(Calculator::Bundled(BundleCalculator)),
        PlanShape::Usage => {
            let window = window.ok_or_else(|| {
                PricingError::Configuration(format!(
                    "usage price plan {} needs a billing window",
                    plan.id
                ))
            })?;
            Ok(Calculator::Usage(UsageCalculator::new(window)))
        }
        PlanShape::Characteristic => {
            if !subject.has_characteristics() {
                return Err(PricingError::validation(
                    "characteristics",
                    format!(
                        "price plan {} is characteristic-scoped but {} has no characteristics",
                        plan.id, subject.id
                    ),
                ));
            }
            Ok(Calculator::Characteristic(CharacteristicCalculator))
        }
        PlanShape::Flat => Ok(Calculator::Base(BaseCalculator)),
    }
}

/// Unit price of `plan`, defaulting the currency when the catalog omits it.
pub(crate) fn unit_price(plan: &PricePlan, default_currency: &str) -> Result<Money, PricingError> {
    let value = plan.price_value().ok_or_else(|| {
        PricingError::validation("price.value", format!("price plan {} has no price value", plan.id))
    })?;
    let currency = match plan.price_unit() {
        Some(unit) => unit,
        None => {
            tracing::warn!(
                plan_id = %plan.id,
                default_currency,
                "Price plan has no currency, using the default"
            );
            default_currency
        }
    };
    Money::new(currency, value)
}

/// Round the base and layer the plan's alterations on top.
pub(crate) async fn finalize(
    ctx: &PlanContext<'_>,
    env: &CalculationEnv<'_>,
    unit: Money,
    quantity: Decimal,
    components: Vec<PricedComponent>,
) -> Result<PriceOutcome, PricingError> {
    let plan = ctx.plan;
    let base_amount = unit.times(quantity)?.rounded();

    let (alterations, amount) = if plan.alteration_refs.is_empty() {
        (Vec::new(), base_amount.clone())
    } else {
        let alteration_plans = env.catalog.fetch_alteration_plans(plan).await?;
        let summary = apply_alterations_with_quantity(&unit, quantity, &alteration_plans, ctx.as_of)?;
        (summary.results, summary.altered_amount)
    };

    Ok(PriceOutcome {
        plan_id: plan.id.clone(),
        plan_name: plan.name.clone(),
        shape: plan.shape(),
        base_amount,
        amount,
        alterations,
        components,
    })
}
