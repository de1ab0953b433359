//! Resolves which characteristic-scoped price plan applies to a chosen value.

use crate::error::PricingError;
use crate::models::{numeric_json, Characteristic, CharacteristicValueScope, PricePlan};
use chrono::NaiveDate;

/// A plan together with one of its characteristic scopes.
#[derive(Debug, Clone, Copy)]
pub struct ScopedPlan<'a> {
    pub plan: &'a PricePlan,
    pub scope: &'a CharacteristicValueScope,
}

/// Flatten plans into (plan, scope) pairs, in plan then scope order.
pub fn scoped_plans<'a, I>(plans: I) -> Vec<ScopedPlan<'a>>
where
    I: IntoIterator<Item = &'a PricePlan>,
{
    plans
        .into_iter()
        .flat_map(|plan| {
            plan.characteristic_scopes
                .iter()
                .map(move |scope| ScopedPlan { plan, scope })
        })
        .collect()
}

/// Outcome of a match.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult<'a> {
    /// Forfait plan whose scope value equals the chosen value.
    Perfect(&'a PricePlan),
    /// The single non-forfait plan whose scope admits the value.
    Candidate(&'a PricePlan),
    NotFound,
    /// Ids of every candidate plan.
    Ambiguous(Vec<String>),
}

impl<'a> MatchResult<'a> {
    pub fn plan(&self) -> Option<&'a PricePlan> {
        match self {
            MatchResult::Perfect(plan) | MatchResult::Candidate(plan) => Some(plan),
            _ => None,
        }
    }

    pub fn is_perfect(&self) -> bool {
        matches!(self, MatchResult::Perfect(_))
    }

    /// Ambiguity is a catalog configuration fault surfaced as a validation error.
    pub fn into_result(self, characteristic: &str) -> Result<Option<&'a PricePlan>, PricingError> {
        match self {
            MatchResult::Ambiguous(ids) => Err(PricingError::validation(
                characteristic,
                format!(
                    "ambiguous price plans for characteristic {}: {}",
                    characteristic,
                    ids.join(", ")
                ),
            )),
            other => Ok(other.plan()),
        }
    }
}

/// Find the plan applying to `characteristic` on `as_of`.
///
/// A perfect match short-circuits the search; later candidates are not inspected.
pub fn match_price_plan<'a>(
    characteristic: &Characteristic,
    as_of: NaiveDate,
    candidates: &[ScopedPlan<'a>],
) -> MatchResult<'a> {
    let chosen_number = characteristic.numeric_value();
    let mut matched: Vec<&'a PricePlan> = Vec::new();

    for candidate in candidates {
        let scope = candidate.scope;
        if !scope.applies_to(&characteristic.name) || !scope.is_valid_on(as_of) {
            continue;
        }

        if candidate.plan.is_forfait() {
            match &scope.value {
                Some(value) if values_equal(value, &characteristic.value) => {
                    tracing::debug!(
                        plan_id = %candidate.plan.id,
                        characteristic = %characteristic.name,
                        "Perfect forfait match"
                    );
                    return MatchResult::Perfect(candidate.plan);
                }
                Some(_) => continue,
                None => {}
            }
        }

        if let (Some(range), Some(number)) = (&scope.value_range, chosen_number) {
            if !range.contains(number) {
                continue;
            }
        }

        if !matched.iter().any(|p| p.id == candidate.plan.id) {
            matched.push(candidate.plan);
        }
    }

    match matched.len() {
        0 => MatchResult::NotFound,
        1 => MatchResult::Candidate(matched[0]),
        _ => MatchResult::Ambiguous(matched.into_iter().map(|p| p.id.clone()).collect()),
    }
}

/// Numeric-aware equality; strings compare case-insensitively.
fn values_equal(scope_value: &serde_json::Value, chosen: &serde_json::Value) -> bool {
    if let (Some(a), Some(b)) = (numeric_json(scope_value), numeric_json(chosen)) {
        return a == b;
    }
    match (scope_value, chosen) {
        (serde_json::Value::String(a), serde_json::Value::String(b)) => {
            a.trim().eq_ignore_ascii_case(b.trim())
        }
        (a, b) => a == b,
    }
}
