//! Usage record model.

use crate::models::dates::flexible_date_opt;
use crate::models::product::Characteristic;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One metered usage event, as returned by the usage service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, with = "flexible_date_opt")]
    pub usage_date: Option<NaiveDate>,
    #[serde(default, alias = "usageCharacteristic")]
    pub characteristics: Vec<Characteristic>,
}

impl UsageRecord {
    pub fn new(id: impl Into<String>, usage_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            usage_date: Some(usage_date),
            characteristics: Vec::new(),
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
}
