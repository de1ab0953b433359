//! Money value type.

use crate::error::PricingError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;

/// Decimal places of every surfaced monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Round to cents using banker's rounding (half to even).
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// `a × b`, failing validation instead of overflowing.
pub fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal, PricingError> {
    a.checked_mul(b).ok_or_else(|| out_of_range(format!("{} × {}", a, b)))
}

/// `a × b / c`, multiplying first to keep precision.
pub fn checked_mul_div(a: Decimal, b: Decimal, c: Decimal) -> Result<Decimal, PricingError> {
    checked_mul(a, b)?
        .checked_div(c)
        .ok_or_else(|| out_of_range(format!("{} × {} / {}", a, b, c)))
}

fn out_of_range(expression: String) -> PricingError {
    PricingError::validation(
        "amount",
        format!("{} is outside the supported decimal range", expression),
    )
}

/// Immutable (currency, amount) pair.
///
/// Arithmetic never mixes currencies: combining two values of different
/// currencies is a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Money {
    currency: String,
    amount: Decimal,
}

impl Money {
    pub fn new(currency: impl Into<String>, amount: Decimal) -> Result<Self, PricingError> {
        let currency = currency.into().trim().to_ascii_uppercase();
        if currency.is_empty() {
            return Err(PricingError::validation(
                "currency",
                "currency code must not be empty",
            ));
        }
        Ok(Self { currency, amount })
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Same currency, different amount.
    pub fn with_amount(&self, amount: Decimal) -> Self {
        Self {
            currency: self.currency.clone(),
            amount,
        }
    }

    pub fn zero_like(&self) -> Self {
        self.with_amount(Decimal::ZERO)
    }

    pub fn rounded(&self) -> Self {
        self.with_amount(round_money(self.amount))
    }

    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    pub fn times(&self, factor: Decimal) -> Result<Self, PricingError> {
        Ok(self.with_amount(checked_mul(self.amount, factor)?))
    }

    /// Clamp to zero from below.
    pub fn non_negative(&self) -> Self {
        self.with_amount(self.amount.max(Decimal::ZERO))
    }

    pub fn checked_add(&self, other: &Money) -> Result<Money, PricingError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| out_of_range(format!("{} + {}", self.amount, other.amount)))?;
        Ok(self.with_amount(amount))
    }

    /// Sum in iteration order, starting from zero in `currency`.
    pub fn sum<'a, I>(currency: &str, items: I) -> Result<Money, PricingError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        items
            .into_iter()
            .try_fold(Money::new(currency, Decimal::ZERO)?, |acc, m| {
                acc.checked_add(m)
            })
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), PricingError> {
        if self.currency != other.currency {
            return Err(PricingError::validation(
                "currency",
                format!(
                    "cannot combine amounts in {} and {}",
                    self.currency, other.currency
                ),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", round_money(self.amount), self.currency)
    }
}
