//! Priced results: alteration results, components, billing lines and statements.

use crate::error::PricingError;
use crate::models::cycle::BillCycle;
use crate::models::dates::DateRange;
use crate::models::money::Money;
use crate::models::price_plan::{PlanShape, PriceType};
use serde::Serialize;

/// Effect of one alteration plan on a base amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlterationResult {
    pub source_plan_id: String,
    /// Signed; discounts are negative.
    pub adjustment: Money,
    pub resulting_amount: Money,
}

/// Amount computed for one (sub-)plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedComponent {
    pub plan_id: String,
    pub plan_name: Option<String>,
    pub shape: PlanShape,
    /// Before alterations.
    pub base_amount: Money,
    /// After alterations.
    pub amount: Money,
    pub alterations: Vec<AlterationResult>,
}

/// Result of a single calculator invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceOutcome {
    pub plan_id: String,
    pub plan_name: Option<String>,
    pub shape: PlanShape,
    pub base_amount: Money,
    pub amount: Money,
    pub alterations: Vec<AlterationResult>,
    /// Priced bundle members, in reference order. Empty for other shapes.
    pub components: Vec<PricedComponent>,
}

impl PriceOutcome {
    pub fn is_altered(&self) -> bool {
        !self.alterations.is_empty()
    }

    /// The outcome itself as a component, dropping member detail.
    pub fn into_component(self) -> PricedComponent {
        PricedComponent {
            plan_id: self.plan_id,
            plan_name: self.plan_name,
            shape: self.shape,
            base_amount: self.base_amount,
            amount: self.amount,
            alterations: self.alterations,
        }
    }

    /// One component per bundle member, or the outcome itself otherwise.
    pub fn into_components(self) -> Vec<PricedComponent> {
        if self.shape == PlanShape::Bundled && !self.components.is_empty() {
            self.components
        } else {
            vec![self.into_component()]
        }
    }
}

/// One billed cycle of one plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingLine {
    pub plan_id: String,
    pub plan_name: Option<String>,
    pub price_type: PriceType,
    pub bill_cycle: BillCycle,
    pub base_amount: Money,
    pub amount: Money,
    pub alterations: Vec<AlterationResult>,
    pub components: Vec<PricedComponent>,
}

impl BillingLine {
    pub fn from_outcome(price_type: PriceType, bill_cycle: BillCycle, outcome: PriceOutcome) -> Self {
        Self {
            plan_id: outcome.plan_id,
            plan_name: outcome.plan_name,
            price_type,
            bill_cycle,
            base_amount: outcome.base_amount,
            amount: outcome.amount,
            alterations: outcome.alterations,
            components: outcome.components,
        }
    }
}

/// A plan that could not be billed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFailure {
    pub plan_id: String,
    pub kind: String,
    pub message: String,
    pub retryable: bool,
}

impl PlanFailure {
    pub fn new(plan_id: impl Into<String>, err: &PricingError) -> Self {
        Self {
            plan_id: plan_id.into(),
            kind: err.kind().to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// All billing lines of one product over one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingStatement {
    pub product_id: String,
    pub window: DateRange,
    pub lines: Vec<BillingLine>,
    pub failures: Vec<PlanFailure>,
}

impl BillingStatement {
    pub fn new(product_id: impl Into<String>, window: DateRange) -> Self {
        Self {
            product_id: product_id.into(),
            window,
            lines: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Sum of the successful lines in `currency`.
    pub fn total(&self, currency: &str) -> Result<Money, PricingError> {
        Money::sum(currency, self.lines.iter().map(|l| &l.amount)).map(|m| m.rounded())
    }
}
