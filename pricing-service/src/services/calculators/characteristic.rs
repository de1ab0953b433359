use super::{finalize, unit_price, CalculationEnv, PlanContext, PriceCalculator};
use crate::error::PricingError;
use crate::models::{checked_mul_div, PriceOutcome};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Prices a plan against the value of one subject characteristic.
///
/// A forfait plan costs `price × value`; otherwise the value is first divided by
/// the unit of measure amount, e.g. 1.00 per 10 Mbps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicCalculator;

#[async_trait]
impl PriceCalculator for CharacteristicCalculator {
    async fn calculate_price(
        &self,
        ctx: &PlanContext<'_>,
        env: &CalculationEnv<'_>,
    ) -> Result<PriceOutcome, PricingError> {
        let plan = ctx.plan;
        let scope = plan.characteristic_scopes.first().ok_or_else(|| {
            PricingError::Configuration(format!(
                "price plan {} has no characteristic scope",
                plan.id
            ))
        })?;
        if plan.characteristic_scopes.len() > 1 {
            tracing::warn!(
                plan_id = %plan.id,
                scopes = plan.characteristic_scopes.len(),
                used = %scope.characteristic_name,
                "Price plan has several characteristic scopes, using the first"
            );
        }

        let name = scope.characteristic_name.as_str();
        let characteristic = ctx.subject.find_characteristic(name).ok_or_else(|| {
            PricingError::validation(
                name,
                format!("{} has no characteristic named {}", ctx.subject.id, name),
            )
        })?;
        let value = characteristic.numeric_value().ok_or_else(|| {
            PricingError::validation(
                name,
                format!(
                    "characteristic {} value {} is not numeric",
                    name, characteristic.value
                ),
            )
        })?;

        let price = unit_price(plan, env.default_currency)?;
        let unit = match &plan.unit_of_measure {
            Some(uom) if !uom.is_single_unit() => {
                let per = uom.amount.unwrap_or(Decimal::ONE);
                if per.is_zero() {
                    return Err(PricingError::validation(
                        "unitOfMeasure.amount",
                        format!("price plan {} has a zero unit of measure amount", plan.id),
                    ));
                }
                price.with_amount(checked_mul_div(price.amount(), value, per)?)
            }
            _ => price.times(value)?,
        };

        finalize(ctx, env, unit, ctx.quantity, Vec::new()).await
    }
}
