use super::{finalize, unit_price, CalculationEnv, PlanContext, PriceCalculator};
use crate::error::PricingError;
use crate::models::{checked_mul_div, DateRange, PriceOutcome, UsageRecord};
use crate::services::usage_aggregator::UsageIndex;
use crate::services::validation::validate_usage_record;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Prices metered usage over a billing window: `Σ price × usage / uom.amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageCalculator {
    window: DateRange,
}

impl UsageCalculator {
    pub fn new(window: DateRange) -> Self {
        Self { window }
    }

    pub fn window(&self) -> DateRange {
        self.window
    }
}

#[async_trait]
impl PriceCalculator for UsageCalculator {
    async fn calculate_price(
        &self,
        ctx: &PlanContext<'_>,
        env: &CalculationEnv<'_>,
    ) -> Result<PriceOutcome, PricingError> {
        let plan = ctx.plan;
        let uom = plan.unit_of_measure.as_ref();
        let metric = uom.and_then(|u| u.metric()).ok_or_else(|| {
            PricingError::validation(
                "unitOfMeasure.units",
                format!("usage price plan {} names no usage metric", plan.id),
            )
        })?;
        let per = uom.and_then(|u| u.amount).unwrap_or(Decimal::ONE);
        if per.is_zero() {
            return Err(PricingError::validation(
                "unitOfMeasure.amount",
                format!("price plan {} has a zero unit of measure amount", plan.id),
            ));
        }
        let price = unit_price(plan, env.default_currency)?;

        let fetched: Vec<UsageRecord>;
        let records: &[UsageRecord] = match ctx.simulated_usage {
            Some(records) => records,
            None => {
                fetched = env
                    .usage
                    .fetch_usage_records(ctx.subject.id, &self.window)
                    .await?;
                &fetched
            }
        };
        for record in records {
            validate_usage_record(record)?;
        }

        let index = UsageIndex::build(records);
        let entries = index.entries(metric);
        let (total, skipped) = index.total(metric)?;
        if skipped > 0 {
            tracing::warn!(
                plan_id = %plan.id,
                metric,
                skipped,
                "Ignoring non-numeric usage values"
            );
        }
        if entries.is_empty() {
            tracing::warn!(
                plan_id = %plan.id,
                product_id = %ctx.subject.id,
                metric,
                window = %self.window,
                "No usage recorded for metric, pricing at zero"
            );
        }

        let unit = price.with_amount(checked_mul_div(price.amount(), total, per)?);
        tracing::debug!(
            plan_id = %plan.id,
            metric,
            records = entries.len(),
            total_usage = %total,
            "Usage aggregated"
        );
        finalize(ctx, env, unit, Decimal::ONE, Vec::new()).await
    }
}
