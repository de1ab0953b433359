//! Groups usage records by metric name.

use crate::error::PricingError;
use crate::models::{Characteristic, UsageRecord};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// A usage record and the characteristic that carried the metric.
#[derive(Debug, Clone, Copy)]
pub struct UsageEntry<'a> {
    pub record: &'a UsageRecord,
    pub characteristic: &'a Characteristic,
}

impl UsageEntry<'_> {
    pub fn value(&self) -> Option<Decimal> {
        self.characteristic.numeric_value()
    }
}

/// Lowercased metric name to the entries that carry it, in record order.
///
/// Built per calculation and passed by reference; it is never stored.
#[derive(Debug, Default)]
pub struct UsageIndex<'a> {
    entries: HashMap<String, Vec<UsageEntry<'a>>>,
}

impl<'a> UsageIndex<'a> {
    pub fn build(records: &'a [UsageRecord]) -> Self {
        let mut entries: HashMap<String, Vec<UsageEntry<'a>>> = HashMap::new();
        for record in records {
            for characteristic in &record.characteristics {
                let key = characteristic.name.trim().to_lowercase();
                if key.is_empty() {
                    continue;
                }
                entries.entry(key).or_default().push(UsageEntry {
                    record,
                    characteristic,
                });
            }
        }
        Self { entries }
    }

    pub fn entries(&self, metric: &str) -> &[UsageEntry<'a>] {
        self.entries
            .get(&metric.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sum of the numeric values recorded for `metric`, with the non-numeric entry count.
    pub fn total(&self, metric: &str) -> Result<(Decimal, usize), PricingError> {
        let mut sum = Decimal::ZERO;
        let mut skipped = 0;
        for entry in self.entries(metric) {
            let Some(value) = entry.value() else {
                skipped += 1;
                continue;
            };
            sum = sum.checked_add(value).ok_or_else(|| {
                PricingError::validation(
                    metric,
                    format!(
                        "usage total for {} overflows at record {}",
                        metric, entry.record.id
                    ),
                )
            })?;
        }
        Ok((sum, skipped))
    }
}
