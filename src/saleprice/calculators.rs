//! Core sale price math.
//!
//! Pure functions over `Decimal` amounts: no field lookup, no clock.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::error::Result;

use super::models::Price;

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Used for display rounding of amounts. Banker's rounding rounds to the
/// nearest even number when the value is exactly halfway between two
/// possibilities.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use commerce_saleprice::saleprice::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Round a percentage to a whole number, halves away from zero.
pub fn round_percentage(percentage: Decimal) -> Decimal {
    percentage.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Ratio left to pay after a percentage discount: `(100 - d) / 100`.
pub fn discount_ratio(percentage: Decimal) -> Decimal {
    (Decimal::ONE_HUNDRED - percentage) / Decimal::ONE_HUNDRED
}

/// Apply a percentage discount (0-100) to a list price.
///
/// The amount is not rounded; rounding is left to display.
pub fn apply_percentage_discount(list_price: &Price, percentage: Decimal) -> Price {
    list_price.multiply(discount_ratio(percentage))
}

/// Savings shown next to a discounted price
#[derive(Debug, Clone, PartialEq)]
pub struct Savings {
    pub amount: Price,
    /// Whole-number percentage of the list price; `None` when the list price
    /// is zero or the ratio does not fit in a `Decimal`.
    pub percentage: Option<Decimal>,
}

/// Compute how much the customer saves against the list price.
///
/// Both prices must share a currency.
pub fn calculate_savings(list_price: &Price, resolved_price: &Price) -> Result<Savings> {
    let amount = list_price.subtract(resolved_price)?;

    let percentage = Decimal::ONE_HUNDRED
        .checked_mul(amount.amount())
        .and_then(|scaled| scaled.checked_div(list_price.amount()))
        .map(round_percentage);

    Ok(Savings { amount, percentage })
}
