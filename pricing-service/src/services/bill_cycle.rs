//! Bill-cycle generation: period boundaries and prepaid/postpaid bill dates.

use crate::error::PricingError;
use crate::models::{BillCycle, BillingMode, DateRange, PeriodUnit, PricePlan, PriceType, RecurringChargePeriod};
use chrono::{Days, Months, NaiveDate};

/// Validated period step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Days(u64),
    Months(u32),
}

impl Step {
    fn resolve(period: &RecurringChargePeriod) -> Result<Self, PricingError> {
        if period.length <= 0 {
            return Err(PricingError::Configuration(format!(
                "recurring charge period length must be positive, got {}",
                period.length
            )));
        }
        let length = period.length;
        let overflow = || {
            PricingError::Configuration(format!("recurring charge period length {} is too large", length))
        };

        match &period.unit {
            Some(PeriodUnit::Day) => Ok(Step::Days(length as u64)),
            Some(PeriodUnit::Week) => length
                .checked_mul(7)
                .map(|d| Step::Days(d as u64))
                .ok_or_else(overflow),
            Some(PeriodUnit::Month) => u32::try_from(length).map(Step::Months).map_err(|_| overflow()),
            Some(PeriodUnit::Year) => u32::try_from(length)
                .ok()
                .and_then(|l| l.checked_mul(12))
                .map(Step::Months)
                .ok_or_else(overflow),
            Some(PeriodUnit::Other(unit)) => Err(PricingError::Configuration(format!(
                "unsupported recurring charge period unit: {}",
                unit
            ))),
            None => Err(PricingError::Configuration(
                "recurring charge period has no unit".to_string(),
            )),
        }
    }

    /// `activation + k × step`, always computed from the activation date so that
    /// month-end clamping does not drift.
    fn nth(self, activation: NaiveDate, k: u32) -> Option<NaiveDate> {
        match self {
            Step::Days(days) => days
                .checked_mul(u64::from(k))
                .and_then(|d| activation.checked_add_days(Days::new(d))),
            Step::Months(months) => months
                .checked_mul(k)
                .and_then(|m| activation.checked_add_months(Months::new(m))),
        }
    }
}

/// Period end dates from `activation` up to `horizon`, inclusive.
pub fn period_end_dates(
    period: &RecurringChargePeriod,
    activation: NaiveDate,
    horizon: NaiveDate,
) -> Result<Vec<NaiveDate>, PricingError> {
    let step = Step::resolve(period)?;
    if activation > horizon {
        tracing::warn!(
            activation = %activation,
            horizon = %horizon,
            "Activation date is after the billing horizon, no periods generated"
        );
        return Ok(Vec::new());
    }

    let mut ends = Vec::new();
    let mut k: u32 = 1;
    loop {
        let end = step
            .nth(activation, k)
            .and_then(|next| next.pred_opt())
            .filter(|end| *end <= horizon);
        match end {
            Some(end) => ends.push(end),
            None => break,
        }
        k = match k.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(ends)
}

/// Billing periods for consecutive `ends`: the first starts on `activation`,
/// each later one the day after the previous end.
pub fn billing_periods(ends: &[NaiveDate], activation: NaiveDate) -> Result<Vec<DateRange>, PricingError> {
    let mut start = activation;
    let mut periods = Vec::with_capacity(ends.len());
    for end in ends {
        periods.push(DateRange::new(start, *end)?);
        start = end.succ_opt().ok_or_else(|| {
            PricingError::BadRequest(format!("billing period end {} is out of range", end))
        })?;
    }
    Ok(periods)
}

/// Bill cycles a plan produces between `activation` and `horizon`.
pub fn bill_cycles(
    plan: &PricePlan,
    activation: NaiveDate,
    horizon: NaiveDate,
) -> Result<Vec<BillCycle>, PricingError> {
    let mode = match &plan.price_type {
        PriceType::OneTime => {
            return Ok(vec![BillCycle::new(activation, DateRange::single(activation))]);
        }
        PriceType::Recurring(mode) => *mode,
        PriceType::PayPerUse => BillingMode::Postpaid,
        PriceType::Custom => {
            return Err(PricingError::BadRequest(format!(
                "price plan {} has a custom price type, which has no bill cycle",
                plan.id
            )));
        }
        PriceType::Discount => {
            return Err(PricingError::BadRequest(format!(
                "price plan {} is a discount and is not billed on its own",
                plan.id
            )));
        }
        PriceType::Other(price_type) => {
            return Err(PricingError::Configuration(format!(
                "price plan {} has unsupported price type {}",
                plan.id, price_type
            )));
        }
    };

    let period = plan.recurring_charge_period.as_ref().ok_or_else(|| {
        PricingError::Configuration(format!(
            "price plan {} ({}) has no recurring charge period",
            plan.id, plan.price_type
        ))
    })?;

    let ends = period_end_dates(period, activation, horizon)?;
    let periods = billing_periods(&ends, activation)?;

    let cycles = periods
        .into_iter()
        .map(|p| {
            let bill_date = match mode {
                BillingMode::Prepaid => p.start(),
                BillingMode::Postpaid => p.end(),
            };
            BillCycle::new(bill_date, p)
        })
        .collect();
    Ok(cycles)
}

/// Bill dates of [`bill_cycles`].
pub fn bill_dates(
    plan: &PricePlan,
    activation: NaiveDate,
    horizon: NaiveDate,
) -> Result<Vec<NaiveDate>, PricingError> {
    Ok(bill_cycles(plan, activation, horizon)?
        .into_iter()
        .map(|c| c.bill_date)
        .collect())
}

/// Cycles billed inside `window`, both ends included.
pub fn bill_cycles_in_window(cycles: &[BillCycle], window: &DateRange) -> Vec<BillCycle> {
    cycles
        .iter()
        .filter(|c| window.contains(c.bill_date))
        .copied()
        .collect()
}

/// Date up to which cycles must be generated so every cycle billed in `window` exists.
///
/// For recurring and usage plans this is the end of the period that contains
/// the window end, so a prepaid period starting inside the window is
/// generated even when month-end clamping stretches it.
pub fn billing_horizon(
    plan: &PricePlan,
    activation: NaiveDate,
    window: &DateRange,
) -> Result<NaiveDate, PricingError> {
    let recurring = matches!(plan.price_type, PriceType::Recurring(_) | PriceType::PayPerUse);
    let period = match (&plan.recurring_charge_period, recurring) {
        (Some(period), true) => period,
        _ => return Ok(window.end()),
    };
    let step = Step::resolve(period)?;
    if activation > window.end() {
        return Ok(window.end());
    }

    let mut k: u32 = 1;
    while let Some(end) = step.nth(activation, k).and_then(|next| next.pred_opt()) {
        if end >= window.end() {
            return Ok(end);
        }
        k = match k.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(window.end())
}
