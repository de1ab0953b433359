use super::{finalize, unit_price, CalculationEnv, PlanContext, PriceCalculator};
use crate::error::PricingError;
use crate::models::PriceOutcome;
use async_trait::async_trait;

/// Flat ("forfait") pricing: the plan's price times the quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseCalculator;

#[async_trait]
impl PriceCalculator for BaseCalculator {
    async fn calculate_price(
        &self,
        ctx: &PlanContext<'_>,
        env: &CalculationEnv<'_>,
    ) -> Result<PriceOutcome, PricingError> {
        let unit = unit_price(ctx.plan, env.default_currency)?;
        finalize(ctx, env, unit, ctx.quantity, Vec::new()).await
    }
}
