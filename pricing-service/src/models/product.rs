//! Products, order items and the characteristics they carry.

use crate::models::dates::{flexible_date_opt, DateRange};
use crate::models::price_plan::PricePlanRef;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Named characteristic value of a product, order item or usage record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Characteristic {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Characteristic {
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            value_type: None,
            value: value.into(),
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }

    /// The value as a number, if it is one or is a numeric string.
    pub fn numeric_value(&self) -> Option<Decimal> {
        numeric_json(&self.value)
    }
}

/// Coerce a JSON value to a decimal.
pub fn numeric_json(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => {
            let raw = n.to_string();
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .ok()
        }
        serde_json::Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        _ => None,
    }
}

/// Installed product, as returned by the inventory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "flexible_date_opt")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "productCharacteristic")]
    pub characteristics: Vec<Characteristic>,
    #[serde(default, alias = "productPrice")]
    pub product_prices: Vec<PricePlanRef>,
    #[serde(default)]
    pub billing_account_id: Option<String>,
    #[serde(default)]
    pub related_party_ids: Vec<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            name: None,
            start_date: Some(start_date),
            status: None,
            characteristics: Vec::new(),
            product_prices: Vec::new(),
            billing_account_id: None,
            related_party_ids: Vec::new(),
        }
    }

    pub fn with_characteristic(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.characteristics.push(Characteristic::new(name, value));
        self
    }

    pub fn with_prices<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.product_prices
            .extend(ids.into_iter().map(PricePlanRef::new));
        self
    }

    pub fn subject(&self) -> PricingSubject<'_> {
        PricingSubject {
            id: &self.id,
            characteristics: &self.characteristics,
        }
    }
}

fn default_quantity() -> i64 {
    1
}

/// Line of an order being priced before it is placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub characteristics: Vec<Characteristic>,
    #[serde(default)]
    pub requested_window: Option<DateRange>,
}

impl OrderItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            quantity: 1,
            characteristics: Vec::new(),
            requested_window: None,
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_characteristic(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.characteristics.push(Characteristic::new(name, value));
        self
    }

    pub fn with_window(mut self, window: DateRange) -> Self {
        self.requested_window = Some(window);
        self
    }

    pub fn subject(&self) -> PricingSubject<'_> {
        PricingSubject {
            id: &self.id,
            characteristics: &self.characteristics,
        }
    }
}

/// What a price is computed for: a product or an order item.
#[derive(Debug, Clone, Copy)]
pub struct PricingSubject<'a> {
    pub id: &'a str,
    pub characteristics: &'a [Characteristic],
}

impl<'a> PricingSubject<'a> {
    pub fn find_characteristic(&self, name: &str) -> Option<&'a Characteristic> {
        self.characteristics.iter().find(|c| c.is_named(name))
    }

    pub fn has_characteristics(&self) -> bool {
        !self.characteristics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Characteristic::new("speed", 100).numeric_value(), Some(dec!(100)));
        assert_eq!(Characteristic::new("speed", 2.5).numeric_value(), Some(dec!(2.5)));
        assert_eq!(Characteristic::new("speed", " 42 ").numeric_value(), Some(dec!(42)));
        assert_eq!(Characteristic::new("speed", "1e2").numeric_value(), Some(dec!(100)));
        assert_eq!(Characteristic::new("speed", "fast").numeric_value(), None);
        assert_eq!(Characteristic::new("speed", json!(true)).numeric_value(), None);
    }

    #[test]
    fn test_find_characteristic_ignores_case() {
        let product = Product::new("p-1", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .with_characteristic("Bandwidth", 100);
        let subject = product.subject();
        assert!(subject.find_characteristic("bandwidth").is_some());
        assert!(subject.find_characteristic("latency").is_none());
    }

    #[test]
    fn test_order_item_quantity_defaults_to_one() {
        let item: OrderItem = serde_json::from_str(r#"{"id": "oi-1"}"#).unwrap();
        assert_eq!(item.quantity, 1);
        assert!(item.requested_window.is_none());
    }

    #[test]
    fn test_product_deserializes_inventory_payload() {
        let product: Product = serde_json::from_value(json!({
            "id": "prod-9",
            "startDate": "2025-01-15T08:00:00Z",
            "productCharacteristic": [{"name": "speed", "value": "100"}],
            "productPrice": [{"id": "pop-1"}, {"id": "pop-2"}]
        }))
        .unwrap();
        assert_eq!(product.start_date, NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(product.characteristics.len(), 1);
        assert_eq!(product.product_prices.len(), 2);
    }
}
