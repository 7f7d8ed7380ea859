//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Wallet amounts carry exactly two fractional digits and are persisted as
//! integer minor units.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fractional digits carried by every stored amount.
pub const MONEY_SCALE: u32 = 2;

/// Errors raised when converting amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Amount does not fit into minor units.
    #[error("Amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// Represents a monetary amount with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount, rounded to two fractional digits.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Indian Rupee
    Inr,
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// Pound Sterling
    Gbp,
    /// Singapore Dollar
    Sgd,
}

impl Currency {
    /// Returns the ISO code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inr => "INR",
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Sgd => "SGD",
        }
    }
}

impl Money {
    /// Creates a new Money instance, rounding the amount to two decimals.
    #[must_use]
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: Self::round(amount),
            currency,
        }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Rounds to two decimals, midpoint away from zero.
    #[must_use]
    pub fn round(amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Converts an amount to integer minor units (paise, cents).
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::OutOfRange` if the value does not fit in `i64`.
    pub fn to_minor(amount: Decimal) -> Result<i64, MoneyError> {
        let mut rounded = Self::round(amount);
        rounded.rescale(MONEY_SCALE);
        i64::try_from(rounded.mantissa()).map_err(|_| MoneyError::OutOfRange(amount))
    }

    /// Converts integer minor units back into a two-decimal amount.
    #[must_use]
    pub fn from_minor(minor: i64) -> Decimal {
        Decimal::new(minor, MONEY_SCALE)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INR" => Ok(Self::Inr),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "SGD" => Ok(Self::Sgd),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}
