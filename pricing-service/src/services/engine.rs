//! Pricing engine: bills products over a window and previews order prices.

use crate::clients::{CatalogClient, InventoryClient, UsageClient};
use crate::error::PricingError;
use crate::models::{
    BillingLine, BillingStatement, DateRange, OrderItem, PlanFailure, PriceOutcome, PricePlan,
    PricedComponent, PricingSubject, Product, UsageRecord,
};
use crate::services::bill_cycle::{bill_cycles, bill_cycles_in_window, billing_horizon};
use crate::services::calculators::{
    select_calculator, BaseCalculator, BundleCalculator, CalculationEnv, Calculator,
    CharacteristicCalculator, PlanContext, PriceCalculator, UsageCalculator,
};
use crate::services::metrics::{record_calculation_duration, record_error};
use crate::services::validation::{validate_price_plan, validate_product};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;

/// Engine-wide settings.
#[derive(Debug, Clone)]
pub struct PricingSettings {
    pub default_currency: String,
    /// Date used for validity checks in previews; today when unset.
    pub evaluation_date: Option<NaiveDate>,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            default_currency: "EUR".to_string(),
            evaluation_date: None,
        }
    }
}

#[derive(Clone)]
pub struct PricingEngine {
    catalog: Arc<dyn CatalogClient>,
    inventory: Arc<dyn InventoryClient>,
    usage: Arc<dyn UsageClient>,
    settings: PricingSettings,
}

impl PricingEngine {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        inventory: Arc<dyn InventoryClient>,
        usage: Arc<dyn UsageClient>,
        settings: PricingSettings,
    ) -> Self {
        Self {
            catalog,
            inventory,
            usage,
            settings,
        }
    }

    pub fn settings(&self) -> &PricingSettings {
        &self.settings
    }

    fn env(&self) -> CalculationEnv<'_> {
        CalculationEnv {
            catalog: self.catalog.as_ref(),
            usage: self.usage.as_ref(),
            default_currency: &self.settings.default_currency,
        }
    }

    fn as_of(&self) -> NaiveDate {
        self.settings
            .evaluation_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Fetch a product from inventory and bill it over `window`.
    #[tracing::instrument(skip(self, window), fields(window = %window))]
    pub async fn calculate_bill_for_product(
        &self,
        product_id: &str,
        window: DateRange,
    ) -> Result<BillingStatement, PricingError> {
        let product = self.inventory.fetch_product(product_id).await?;
        self.calculate_bill(&product, window).await
    }

    /// Bill every price plan of `product` whose cycles fall in `window`.
    ///
    /// A plan that fails is reported in the statement's failures; the other
    /// plans are still billed.
    #[tracing::instrument(skip(self, product, window), fields(product_id = %product.id, window = %window))]
    pub async fn calculate_bill(
        &self,
        product: &Product,
        window: DateRange,
    ) -> Result<BillingStatement, PricingError> {
        let started = Instant::now();
        if let Err(e) = validate_product(product) {
            record_error(e.kind(), "calculate_bill");
            return Err(e);
        }
        let activation = product.start_date.ok_or_else(|| {
            PricingError::validation("startDate", "product start date is required")
        })?;

        tracing::info!(plans = product.product_prices.len(), "Calculating bill");

        let mut statement = BillingStatement::new(product.id.clone(), window);
        for plan_ref in &product.product_prices {
            match self.bill_plan(product, &plan_ref.id, activation, &window).await {
                Ok(lines) => statement.lines.extend(lines),
                Err(e) => {
                    tracing::error!(
                        plan_id = %plan_ref.id,
                        error_kind = e.kind(),
                        error = %e,
                        "Failed to bill price plan"
                    );
                    record_error(e.kind(), "calculate_bill");
                    statement.failures.push(PlanFailure::new(plan_ref.id.clone(), &e));
                }
            }
        }

        record_calculation_duration("calculate_bill", started.elapsed().as_secs_f64());
        tracing::info!(
            lines = statement.lines.len(),
            failures = statement.failures.len(),
            "Bill calculated"
        );
        Ok(statement)
    }

    async fn bill_plan(
        &self,
        product: &Product,
        plan_id: &str,
        activation: NaiveDate,
        window: &DateRange,
    ) -> Result<Vec<BillingLine>, PricingError> {
        let plan = self.catalog.fetch_price_plan(plan_id).await?;
        validate_price_plan(&plan, &self.settings.default_currency)?;

        let horizon = billing_horizon(&plan, activation, window)?;
        let cycles = bill_cycles(&plan, activation, horizon)?;
        let in_window = bill_cycles_in_window(&cycles, window);
        tracing::debug!(
            plan_id = %plan.id,
            generated = cycles.len(),
            in_window = in_window.len(),
            "Bill cycles generated"
        );

        let subject = product.subject();
        let env = self.env();
        let mut lines = Vec::with_capacity(in_window.len());
        for cycle in in_window {
            let period = cycle.billing_period;
            let calculator = select_calculator(&plan, &subject, Some(period))?;
            let ctx = PlanContext::new(&plan, subject, cycle.bill_date).with_window(Some(period));
            let outcome = calculator.calculate_price(&ctx, &env).await?;
            lines.push(BillingLine::from_outcome(plan.price_type.clone(), cycle, outcome));
        }
        Ok(lines)
    }

    /// Price an order item against `plan` before the order is placed.
    ///
    /// Usage plans price `usage` instead of fetching it; their window is the
    /// item's requested window, else the span of the supplied usage dates.
    #[tracing::instrument(skip(self, item, plan, usage), fields(item_id = %item.id, plan_id = %plan.id))]
    pub async fn calculate_order_preview_price(
        &self,
        item: &OrderItem,
        plan: &PricePlan,
        usage: Option<&[UsageRecord]>,
    ) -> Result<Vec<PricedComponent>, PricingError> {
        let started = Instant::now();
        if item.quantity <= 0 {
            return Err(PricingError::BadRequest(format!(
                "order item {} has a non-positive quantity {}",
                item.id, item.quantity
            )));
        }
        validate_price_plan(plan, &self.settings.default_currency)?;

        let window = item
            .requested_window
            .or_else(|| usage.and_then(usage_span));
        let subject = item.subject();
        let calculator = select_calculator(plan, &subject, window)?;
        let ctx = PlanContext::new(plan, subject, self.as_of())
            .with_quantity(Decimal::from(item.quantity))
            .with_window(window)
            .with_simulated_usage(usage);

        let outcome = calculator.calculate_price(&ctx, &self.env()).await?;
        record_calculation_duration("order_preview", started.elapsed().as_secs_f64());
        tracing::info!(
            shape = outcome.shape.as_str(),
            amount = %outcome.amount,
            "Order preview priced"
        );
        Ok(outcome.into_components())
    }

    /// Price `plan` with whichever calculator its shape selects.
    pub async fn calculate_plan_price(
        &self,
        plan: &PricePlan,
        subject: PricingSubject<'_>,
        window: Option<DateRange>,
    ) -> Result<PriceOutcome, PricingError> {
        let calculator = select_calculator(plan, &subject, window)?;
        self.run(calculator, plan, subject, window).await
    }

    pub async fn calculate_bundle_price(
        &self,
        plan: &PricePlan,
        subject: PricingSubject<'_>,
        window: Option<DateRange>,
    ) -> Result<PriceOutcome, PricingError> {
        self.run(Calculator::Bundled(BundleCalculator), plan, subject, window)
            .await
    }

    pub async fn calculate_characteristic_price(
        &self,
        plan: &PricePlan,
        subject: PricingSubject<'_>,
    ) -> Result<PriceOutcome, PricingError> {
        self.run(
            Calculator::Characteristic(CharacteristicCalculator),
            plan,
            subject,
            None,
        )
        .await
    }

    pub async fn calculate_usage_price(
        &self,
        plan: &PricePlan,
        subject: PricingSubject<'_>,
        window: DateRange,
    ) -> Result<PriceOutcome, PricingError> {
        self.run(
            Calculator::Usage(UsageCalculator::new(window)),
            plan,
            subject,
            Some(window),
        )
        .await
    }

    pub async fn calculate_base_price(
        &self,
        plan: &PricePlan,
        subject: PricingSubject<'_>,
    ) -> Result<PriceOutcome, PricingError> {
        self.run(Calculator::Base(BaseCalculator), plan, subject, None)
            .await
    }

    async fn run(
        &self,
        calculator: Calculator,
        plan: &PricePlan,
        subject: PricingSubject<'_>,
        window: Option<DateRange>,
    ) -> Result<PriceOutcome, PricingError> {
        let ctx = PlanContext::new(plan, subject, self.as_of()).with_window(window);
        calculator.calculate_price(&ctx, &self.env()).await
    }
}

/// Smallest range covering every dated record.
fn usage_span(records: &[UsageRecord]) -> Option<DateRange> {
    let mut dates = records.iter().filter_map(|r| r.usage_date);
    let first = dates.next()?;
    let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    DateRange::new(start, end).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_span_covers_all_dated_records() {
        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
        let mut undated = UsageRecord::new("u0", day(1));
        undated.usage_date = None;
        let records = vec![
            UsageRecord::new("u1", day(12)),
            undated,
            UsageRecord::new("u2", day(3)),
            UsageRecord::new("u3", day(20)),
        ];
        let span = usage_span(&records).unwrap();
        assert_eq!(span.start(), day(3));
        assert_eq!(span.end(), day(20));

        assert!(usage_span(&[]).is_none());
    }
}
