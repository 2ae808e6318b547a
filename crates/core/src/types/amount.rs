//! Money amount type using decimal arithmetic.

use core::fmt;
use core::ops::{Add, AddAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing an [`Amount`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum AmountError {
    /// The amount is negative.
    #[error("amount cannot be negative")]
    Negative,
}

/// A non-negative money amount with two-decimal-place currency semantics.
///
/// All prices and totals in the lifecycle core are KES amounts stored as
/// `numeric(_, 2)` in the database. The wrapper rounds to two decimal
/// places on construction (banker's rounding) and rejects negative values,
/// so a validated `Amount` can be bound to the database unchanged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an `Amount` from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Negative`] if the value is below zero.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative);
        }
        Ok(Self(value.round_dp(2)))
    }

    /// Create an `Amount` from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The underlying decimal value.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply a unit amount by a line quantity.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Amount {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Amount {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let decimal = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(decimal)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Amount {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn rejects_negative() {
        assert!(Amount::new(dec!(-0.01)).is_err());
        assert!(Amount::new(dec!(0)).is_ok());
    }

    #[test]
    fn rounds_to_two_places() {
        let amount = Amount::new(dec!(10.005)).unwrap();
        assert_eq!(amount.as_decimal(), dec!(10.00));
        let amount = Amount::new(dec!(10.015)).unwrap();
        assert_eq!(amount.as_decimal(), dec!(10.02));
    }

    #[test]
    fn line_total_multiplies_by_quantity() {
        let unit = Amount::new(dec!(10.00)).unwrap();
        assert_eq!(unit.line_total(3).as_decimal(), dec!(30.00));
        assert_eq!(unit.line_total(0), Amount::ZERO);
    }

    #[test]
    fn sums_accumulate() {
        let mut total = Amount::ZERO;
        total += Amount::new(dec!(20.00)).unwrap();
        total += Amount::new(dec!(5.00)).unwrap();
        assert_eq!(total.as_decimal(), dec!(25.00));
        assert_eq!(total.to_string(), "25.00");
    }
}
