//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The amount is zero or negative.
    #[error("price must be greater than zero")]
    NotPositive,
}

/// A positive price in the store's currency, held at two decimal places.
///
/// Construction always rounds to cents (midpoint away from zero), so a
/// `Price` is exactly what gets persisted.
///
/// ```
/// use storehub_core::Price;
///
/// let price = Price::parse("4.005").unwrap();
/// assert_eq!(price.to_string(), "$4.01");
///
/// assert!(Price::parse("0").is_err());
/// assert!(Price::parse("-3").is_err());
/// assert!(Price::parse("abc").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Number of decimal places every price is stored with.
    pub const SCALE: u32 = 2;

    /// Create a price from a decimal amount, rounding to cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotPositive`] if the rounded amount is not above zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        let rounded = amount.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        Ok(Self(rounded))
    }

    /// Parse a price from user input such as `"12.5"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not a number, or not positive.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// The rounded decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount as a float, for backends that store numbers as doubles.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}
