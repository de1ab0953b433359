//! Bill cycle model.

use crate::models::dates::DateRange;
use chrono::NaiveDate;
use serde::Serialize;

/// One billable event: the date it is billed and the period it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillCycle {
    pub bill_date: NaiveDate,
    pub billing_period: DateRange,
}

impl BillCycle {
    pub fn new(bill_date: NaiveDate, billing_period: DateRange) -> Self {
        Self {
            bill_date,
            billing_period,
        }
    }
}
