//! Price plan model (catalog "product offering price").

use crate::models::dates::ValidFor;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// When a recurring plan bills within each period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    Prepaid,
    Postpaid,
}

impl BillingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingMode::Prepaid => "prepaid",
            BillingMode::Postpaid => "postpaid",
        }
    }
}

/// Price type of a plan.
///
/// Unrecognized catalog values are kept as `Other` so the plan still decodes;
/// pricing or billing such a plan is a configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PriceType {
    OneTime,
    Recurring(BillingMode),
    PayPerUse,
    Custom,
    Discount,
    Other(String),
}

impl PriceType {
    pub fn as_str(&self) -> &str {
        match self {
            PriceType::OneTime => "oneTime",
            PriceType::Recurring(BillingMode::Prepaid) => "recurring-prepaid",
            PriceType::Recurring(BillingMode::Postpaid) => "recurring-postpaid",
            PriceType::PayPerUse => "payPerUse",
            PriceType::Custom => "custom",
            PriceType::Discount => "discount",
            PriceType::Other(s) => s,
        }
    }

    /// Parse a catalog price type. A bare `recurring` bills postpaid.
    pub fn from_string(s: &str) -> Self {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "onetime" => PriceType::OneTime,
            "recurring" | "recurringpostpaid" | "postpaid" => {
                PriceType::Recurring(BillingMode::Postpaid)
            }
            "recurringprepaid" | "prepaid" => PriceType::Recurring(BillingMode::Prepaid),
            "usage" | "payperuse" => PriceType::PayPerUse,
            "custom" => PriceType::Custom,
            "discount" | "allowance" => PriceType::Discount,
            _ => PriceType::Other(s.trim().to_string()),
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, PriceType::Recurring(_))
    }
}

impl From<String> for PriceType {
    fn from(value: String) -> Self {
        PriceType::from_string(&value)
    }
}

impl From<PriceType> for String {
    fn from(value: PriceType) -> Self {
        match value {
            PriceType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LifecycleStatus {
    InStudy,
    InDesign,
    InTest,
    Active,
    Launched,
    Rejected,
    Retired,
    Obsolete,
    Other(String),
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &str {
        match self {
            LifecycleStatus::InStudy => "In study",
            LifecycleStatus::InDesign => "In design",
            LifecycleStatus::InTest => "In test",
            LifecycleStatus::Active => "Active",
            LifecycleStatus::Launched => "Launched",
            LifecycleStatus::Rejected => "Rejected",
            LifecycleStatus::Retired => "Retired",
            LifecycleStatus::Obsolete => "Obsolete",
            LifecycleStatus::Other(s) => s,
        }
    }

    pub fn from_string(s: &str) -> Self {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "instudy" => LifecycleStatus::InStudy,
            "indesign" => LifecycleStatus::InDesign,
            "intest" => LifecycleStatus::InTest,
            "active" => LifecycleStatus::Active,
            "launched" => LifecycleStatus::Launched,
            "rejected" => LifecycleStatus::Rejected,
            "retired" => LifecycleStatus::Retired,
            "obsolete" => LifecycleStatus::Obsolete,
            _ => LifecycleStatus::Other(s.trim().to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LifecycleStatus::Active | LifecycleStatus::Launched)
    }
}

impl From<String> for LifecycleStatus {
    fn from(value: String) -> Self {
        LifecycleStatus::from_string(&value)
    }
}

impl From<LifecycleStatus> for String {
    fn from(value: LifecycleStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Unit of a recurring charge period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Year,
    /// Kept verbatim so the bill-cycle generator can report it.
    Other(String),
}

impl PeriodUnit {
    pub fn as_str(&self) -> &str {
        match self {
            PeriodUnit::Day => "day",
            PeriodUnit::Week => "week",
            PeriodUnit::Month => "month",
            PeriodUnit::Year => "year",
            PeriodUnit::Other(s) => s,
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "days" | "daily" => PeriodUnit::Day,
            "week" | "weeks" | "weekly" => PeriodUnit::Week,
            "month" | "months" | "monthly" => PeriodUnit::Month,
            "year" | "years" | "yearly" | "annual" | "annually" => PeriodUnit::Year,
            _ => PeriodUnit::Other(s.to_string()),
        }
    }
}

impl From<String> for PeriodUnit {
    fn from(value: String) -> Self {
        PeriodUnit::from_string(&value)
    }
}

impl From<PeriodUnit> for String {
    fn from(value: PeriodUnit) -> Self {
        value.as_str().to_string()
    }
}

/// How often a recurring plan re-bills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringChargePeriod {
    pub length: i64,
    #[serde(default)]
    pub unit: Option<PeriodUnit>,
}

impl RecurringChargePeriod {
    pub fn new(length: i64, unit: PeriodUnit) -> Self {
        Self {
            length,
            unit: Some(unit),
        }
    }
}

/// Raw catalog price; either part may be missing and is checked by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAmount {
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub value: Option<Decimal>,
}

/// Quantity the price refers to, e.g. 10 GB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitOfMeasure {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub units: Option<String>,
}

impl UnitOfMeasure {
    pub fn new(amount: Decimal, units: impl Into<String>) -> Self {
        Self {
            amount: Some(amount),
            units: Some(units.into()),
        }
    }

    /// Whether this denotes a single unit.
    pub fn is_single_unit(&self) -> bool {
        self.amount.map_or(true, |a| a == Decimal::ONE)
    }

    /// The metric name, if present and non-blank.
    pub fn metric(&self) -> Option<&str> {
        self.units
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// Inclusive numeric range a scope applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub from: Option<Decimal>,
    #[serde(default)]
    pub to: Option<Decimal>,
}

impl ValueRange {
    pub fn contains(&self, value: Decimal) -> bool {
        self.from.map_or(true, |from| from <= value) && self.to.map_or(true, |to| value <= to)
    }
}

/// Binds a plan's price to one characteristic value or range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacteristicValueScope {
    #[serde(alias = "name")]
    pub characteristic_name: String,
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub value_range: Option<ValueRange>,
    #[serde(default)]
    pub unit_of_measure: Option<String>,
    #[serde(default)]
    pub valid_for: Option<ValidFor>,
}

impl CharacteristicValueScope {
    pub fn new(characteristic_name: impl Into<String>) -> Self {
        Self {
            characteristic_name: characteristic_name.into(),
            value_type: None,
            value: None,
            value_range: None,
            unit_of_measure: None,
            valid_for: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_range(mut self, from: Option<Decimal>, to: Option<Decimal>) -> Self {
        self.value_range = Some(ValueRange { from, to });
        self
    }

    pub fn with_valid_for(mut self, valid_for: ValidFor) -> Self {
        self.valid_for = Some(valid_for);
        self
    }

    pub fn applies_to(&self, name: &str) -> bool {
        self.characteristic_name.trim().eq_ignore_ascii_case(name.trim())
    }

    pub fn is_valid_on(&self, day: NaiveDate) -> bool {
        self.valid_for.unwrap_or_default().contains(day)
    }
}

/// Reference to another price plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePlanRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

impl PricePlanRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            href: None,
        }
    }
}

/// Calculation shape of a plan, in dispatch precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanShape {
    Bundled,
    Usage,
    Characteristic,
    Flat,
}

impl PlanShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanShape::Bundled => "bundled",
            PlanShape::Usage => "usage",
            PlanShape::Characteristic => "characteristic",
            PlanShape::Flat => "flat",
        }
    }
}

/// A priced offering definition, read from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePlan {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub price_type: PriceType,
    #[serde(default)]
    pub is_bundle: bool,
    #[serde(default)]
    pub lifecycle_status: Option<LifecycleStatus>,
    #[serde(default)]
    pub valid_for: Option<ValidFor>,
    #[serde(default)]
    pub price: Option<PriceAmount>,
    #[serde(default)]
    pub unit_of_measure: Option<UnitOfMeasure>,
    #[serde(default)]
    pub recurring_charge_period: Option<RecurringChargePeriod>,
    #[serde(default, alias = "prodSpecCharValueUse")]
    pub characteristic_scopes: Vec<CharacteristicValueScope>,
    #[serde(default, alias = "bundledPopRelationship")]
    pub bundled_plan_refs: Vec<PricePlanRef>,
    #[serde(default, alias = "popRelationship")]
    pub alteration_refs: Vec<PricePlanRef>,
    #[serde(default)]
    pub percentage: Option<Decimal>,
}

impl PricePlan {
    /// Active plan with no price, scopes or references.
    pub fn new(id: impl Into<String>, price_type: PriceType) -> Self {
        Self {
            id: id.into(),
            name: None,
            price_type,
            is_bundle: false,
            lifecycle_status: Some(LifecycleStatus::Active),
            valid_for: None,
            price: None,
            unit_of_measure: None,
            recurring_charge_period: None,
            characteristic_scopes: Vec::new(),
            bundled_plan_refs: Vec::new(),
            alteration_refs: Vec::new(),
            percentage: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_price(mut self, unit: &str, value: Decimal) -> Self {
        self.price = Some(PriceAmount {
            unit: Some(unit.to_string()),
            value: Some(value),
        });
        self
    }

    pub fn with_unit_of_measure(mut self, amount: Decimal, units: &str) -> Self {
        self.unit_of_measure = Some(UnitOfMeasure::new(amount, units));
        self
    }

    pub fn with_period(mut self, length: i64, unit: PeriodUnit) -> Self {
        self.recurring_charge_period = Some(RecurringChargePeriod::new(length, unit));
        self
    }

    pub fn with_scope(mut self, scope: CharacteristicValueScope) -> Self {
        self.characteristic_scopes.push(scope);
        self
    }

    pub fn with_lifecycle(mut self, status: LifecycleStatus) -> Self {
        self.lifecycle_status = Some(status);
        self
    }

    pub fn with_valid_for(mut self, valid_for: ValidFor) -> Self {
        self.valid_for = Some(valid_for);
        self
    }

    pub fn with_percentage(mut self, percentage: Decimal) -> Self {
        self.percentage = Some(percentage);
        self
    }

    pub fn with_alterations<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alteration_refs
            .extend(ids.into_iter().map(PricePlanRef::new));
        self
    }

    /// Mark as a bundle of the given member plans.
    pub fn bundle_of<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.is_bundle = true;
        self.bundled_plan_refs
            .extend(ids.into_iter().map(PricePlanRef::new));
        self
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle_status
            .as_ref()
            .is_some_and(LifecycleStatus::is_active)
    }

    pub fn is_valid_on(&self, day: NaiveDate) -> bool {
        self.valid_for.unwrap_or_default().contains(day)
    }

    /// Forfait: no unit of measure, or one denoting a single unit.
    pub fn is_forfait(&self) -> bool {
        self.unit_of_measure
            .as_ref()
            .map_or(true, UnitOfMeasure::is_single_unit)
    }

    pub fn price_value(&self) -> Option<Decimal> {
        self.price.as_ref().and_then(|p| p.value)
    }

    pub fn price_unit(&self) -> Option<&str> {
        self.price
            .as_ref()
            .and_then(|p| p.unit.as_deref())
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// Shape classification. Bundling wins over every other signal.
    pub fn shape(&self) -> PlanShape {
        if self.is_bundle {
            PlanShape::Bundled
        } else if self.price_type == PriceType::PayPerUse {
            PlanShape::Usage
        } else if !self.characteristic_scopes.is_empty() {
            PlanShape::Characteristic
        } else {
            PlanShape::Flat
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_type_parsing() {
        assert_eq!(PriceType::from_string("oneTime"), PriceType::OneTime);
        assert_eq!(PriceType::from_string("one_time"), PriceType::OneTime);
        assert_eq!(
            PriceType::from_string("recurring"),
            PriceType::Recurring(BillingMode::Postpaid)
        );
        assert_eq!(
            PriceType::from_string("Recurring-Prepaid"),
            PriceType::Recurring(BillingMode::Prepaid)
        );
        assert_eq!(PriceType::from_string("usage"), PriceType::PayPerUse);
        assert_eq!(PriceType::from_string("pay_per_use"), PriceType::PayPerUse);
        assert_eq!(PriceType::from_string("discount"), PriceType::Discount);
        assert_eq!(
            PriceType::from_string(" barter "),
            PriceType::Other("barter".to_string())
        );
        assert_eq!(PriceType::Other("barter".to_string()).to_string(), "barter");
    }

    #[test]
    fn test_lifecycle_status_activity() {
        assert!(LifecycleStatus::from_string("Active").is_active());
        assert!(LifecycleStatus::from_string("launched").is_active());
        assert!(!LifecycleStatus::from_string("In design").is_active());
        assert_eq!(
            LifecycleStatus::from_string("Pending approval"),
            LifecycleStatus::Other("Pending approval".to_string())
        );
    }

    #[test]
    fn test_shape_precedence() {
        let scope = CharacteristicValueScope::new("speed");
        let bundle = PricePlan::new("b", PriceType::PayPerUse)
            .with_scope(scope.clone())
            .bundle_of(["m1"]);
        assert_eq!(bundle.shape(), PlanShape::Bundled);

        let usage = PricePlan::new("u", PriceType::PayPerUse).with_scope(scope.clone());
        assert_eq!(usage.shape(), PlanShape::Usage);

        let scoped =
            PricePlan::new("c", PriceType::Recurring(BillingMode::Postpaid)).with_scope(scope);
        assert_eq!(scoped.shape(), PlanShape::Characteristic);

        let flat = PricePlan::new("f", PriceType::OneTime);
        assert_eq!(flat.shape(), PlanShape::Flat);
    }

    #[test]
    fn test_forfait_detection() {
        let no_uom = PricePlan::new("a", PriceType::OneTime);
        assert!(no_uom.is_forfait());
        let one_unit = PricePlan::new("b", PriceType::OneTime).with_unit_of_measure(dec!(1), "GB");
        assert!(one_unit.is_forfait());
        let per_ten = PricePlan::new("c", PriceType::OneTime).with_unit_of_measure(dec!(10), "GB");
        assert!(!per_ten.is_forfait());
    }

    #[test]
    fn test_deserialize_catalog_payload() {
        let json = r#"{
            "id": "pop-internet",
            "name": "Internet monthly fee",
            "priceType": "recurring-prepaid",
            "lifecycleStatus": "Launched",
            "validFor": {"startDateTime": "2024-01-01T00:00:00Z"},
            "price": {"unit": "EUR", "value": 29.99},
            "recurringChargePeriod": {"length": 1, "unit": "month"},
            "popRelationship": [{"id": "pop-promo"}]
        }"#;
        let plan: PricePlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.price_type, PriceType::Recurring(BillingMode::Prepaid));
        assert!(plan.is_active());
        assert_eq!(plan.price_value(), Some(dec!(29.99)));
        assert_eq!(plan.price_unit(), Some("EUR"));
        assert_eq!(
            plan.recurring_charge_period,
            Some(RecurringChargePeriod::new(1, PeriodUnit::Month))
        );
        assert_eq!(plan.alteration_refs, vec![PricePlanRef::new("pop-promo")]);
        assert!(!plan.is_bundle);
    }

    #[test]
    fn test_unknown_period_unit_is_preserved() {
        let period: RecurringChargePeriod =
            serde_json::from_str(r#"{"length": 1, "unit": "fortnight"}"#).unwrap();
        assert_eq!(period.unit, Some(PeriodUnit::Other("fortnight".to_string())));
    }
}
