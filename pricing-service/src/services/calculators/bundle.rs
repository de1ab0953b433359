use super::{
    finalize, select_calculator, BaseCalculator, CalculationEnv, Calculator, PlanContext,
    PriceCalculator,
};
use crate::error::PricingError;
use crate::models::{Money, PriceOutcome, PricePlan};
use crate::services::matcher::{match_price_plan, MatchResult, ScopedPlan};
use crate::services::validation::validate_price_plan;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Prices a bundle as the sum of its members.
///
/// Unscoped members are always priced. Scoped members compete per
/// characteristic name and only the plan the matcher picks is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleCalculator;

#[async_trait]
impl PriceCalculator for BundleCalculator {
    async fn calculate_price(
        &self,
        ctx: &PlanContext<'_>,
        env: &CalculationEnv<'_>,
    ) -> Result<PriceOutcome, PricingError> {
        let plan = ctx.plan;
        if plan.bundled_plan_refs.is_empty() {
            return Err(PricingError::Configuration(format!(
                "bundle price plan {} has no bundled price plans",
                plan.id
            )));
        }

        let members = env.catalog.fetch_bundle_members(plan).await?;
        for member in &members {
            validate_price_plan(member, env.default_currency)?;
        }

        let selected = resolve_scoped_members(ctx, &members)?;

        let mut components = Vec::with_capacity(members.len());
        for member in &members {
            let calculator = if member.characteristic_scopes.is_empty() {
                select_calculator(member, &ctx.subject, ctx.window)?
            } else {
                match selected.get(member.id.as_str()) {
                    Some(true) => Calculator::Base(BaseCalculator),
                    Some(false) => select_calculator(member, &ctx.subject, ctx.window)?,
                    None => continue,
                }
            };
            let outcome = calculator
                .calculate_price(&ctx.for_plan(member), env)
                .await?;
            components.push(outcome.into_component());
        }

        let currency = plan
            .price_unit()
            .map(str::to_string)
            .or_else(|| components.first().map(|c| c.amount.currency().to_string()))
            .unwrap_or_else(|| env.default_currency.to_string());
        if components.is_empty() {
            tracing::warn!(
                plan_id = %plan.id,
                subject = %ctx.subject.id,
                "No bundle member applies, pricing at zero"
            );
        }
        let total = Money::sum(&currency, components.iter().map(|c| &c.amount))?;

        tracing::debug!(
            plan_id = %plan.id,
            members = members.len(),
            priced = components.len(),
            total = %total,
            "Bundle members priced"
        );
        finalize(ctx, env, total, Decimal::ONE, components).await
    }
}

/// Run the matcher once per characteristic name over the scoped members.
///
/// Returns the selected plan ids, mapped to whether the match was perfect.
fn resolve_scoped_members<'m>(
    ctx: &PlanContext<'_>,
    members: &'m [PricePlan],
) -> Result<HashMap<&'m str, bool>, PricingError> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ScopedPlan<'m>>> = HashMap::new();
    for plan in members {
        for scope in &plan.characteristic_scopes {
            let key = scope.characteristic_name.trim().to_lowercase();
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_default().push(ScopedPlan { plan, scope });
        }
    }

    let mut selected = HashMap::new();
    for name in &order {
        let candidates = groups.get(name).map(Vec::as_slice).unwrap_or(&[]);
        let Some(characteristic) = ctx.subject.find_characteristic(name) else {
            tracing::warn!(
                bundle_id = %ctx.plan.id,
                characteristic = %name,
                subject = %ctx.subject.id,
                "Subject lacks the characteristic scoping bundle members, skipping them"
            );
            continue;
        };

        match match_price_plan(characteristic, ctx.as_of, candidates) {
            MatchResult::Perfect(plan) => {
                selected.insert(plan.id.as_str(), true);
            }
            MatchResult::Candidate(plan) => {
                selected.entry(plan.id.as_str()).or_insert(false);
            }
            MatchResult::NotFound => {
                tracing::warn!(
                    bundle_id = %ctx.plan.id,
                    characteristic = %name,
                    value = %characteristic.value,
                    "No bundle member matches the characteristic value, skipping"
                );
            }
            ambiguous @ MatchResult::Ambiguous(_) => {
                ambiguous.into_result(name)?;
            }
        }
    }
    Ok(selected)
}
