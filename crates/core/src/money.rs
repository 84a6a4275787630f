//! Money
//!
//! All amounts are unsigned minor units (pence/cents). Arithmetic is checked; anything that
//! would overflow surfaces as an [`AmountError`] rather than wrapping.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

/// Number of decimal places carried by minor units.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Errors from monetary arithmetic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// An addition or multiplication exceeded the representable range.
    #[error("amount arithmetic overflowed")]
    Overflow,

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not representable")]
    PercentConversion,
}

/// Calculate a percentage of a minor unit amount, rounding half away from zero.
///
/// # Errors
///
/// Returns [`AmountError::PercentConversion`] if the product overflows or is negative.
pub fn percent_of_minor(percent: Percentage, minor: u64) -> Result<u64, AmountError> {
    let minor = Decimal::from_u64(minor).ok_or(AmountError::PercentConversion)?;

    (percent * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(AmountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(AmountError::PercentConversion)
}

/// Multiply a per-unit amount by a quantity.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] if the result does not fit in `u64`.
pub fn times(unit: u64, quantity: u32) -> Result<u64, AmountError> {
    unit.checked_mul(u64::from(quantity))
        .ok_or(AmountError::Overflow)
}

/// Add two amounts.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] if the result does not fit in `u64`.
pub fn add(a: u64, b: u64) -> Result<u64, AmountError> {
    a.checked_add(b).ok_or(AmountError::Overflow)
}

/// Sum a sequence of amounts.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] if the running total does not fit in `u64`.
pub fn sum(amounts: impl IntoIterator<Item = u64>) -> Result<u64, AmountError> {
    amounts.into_iter().try_fold(0_u64, add)
}

/// Express minor units as a two decimal place `Decimal` (e.g. `2070` -> `20.70`).
pub fn to_decimal(minor: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(minor), MINOR_UNIT_SCALE)
}

/// Wrap minor units as displayable money in the given currency.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] if the amount does not fit in `i64`.
pub fn to_money(minor: u64, currency: &'static Currency) -> Result<Money<'static, Currency>, AmountError> {
    let minor = i64::try_from(minor).map_err(|_err| AmountError::Overflow)?;

    Ok(Money::from_minor(minor, currency))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percent_of_minor_calculates_correctly() -> TestResult {
        assert_eq!(percent_of_minor(Percentage::from(0.25), 200)?, 50);
        assert_eq!(percent_of_minor(Percentage::from(0.10), 2300)?, 230);

        Ok(())
    }

    #[test]
    fn percent_of_minor_rounds_half_away_from_zero() -> TestResult {
        // 10% of 105 = 10.5 -> 11
        assert_eq!(percent_of_minor(Percentage::from(0.10), 105)?, 11);

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let result = percent_of_minor(Percentage::from(2.0), u64::MAX);

        assert_eq!(result, Err(AmountError::PercentConversion));
    }

    #[test]
    fn times_and_sum_are_checked() {
        assert_eq!(times(u64::MAX, 2), Err(AmountError::Overflow));
        assert_eq!(sum([u64::MAX, 1]), Err(AmountError::Overflow));
        assert_eq!(sum([100, 250, 5]), Ok(355));
    }

    #[test]
    fn to_decimal_keeps_two_places() {
        assert_eq!(to_decimal(2070).to_string(), "20.70");
        assert_eq!(to_decimal(0).to_string(), "0.00");
        assert_eq!(to_decimal(5).to_string(), "0.05");
    }

    #[test]
    fn to_money_wraps_minor_units() -> TestResult {
        assert_eq!(to_money(2070, GBP)?, Money::from_minor(2070, GBP));
        assert_eq!(to_money(u64::MAX, GBP), Err(AmountError::Overflow));

        Ok(())
    }
}
