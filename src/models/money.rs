//! Monetary helpers.
//!
//! Amounts are `Decimal` rupees, never floats. Everything that leaves a
//! calculation is rounded to paise (2 dp), half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `value * percent / 100`, rounded to 2 dp.
pub fn percent_of(value: Decimal, percent: Decimal) -> Decimal {
    round_money(value * percent / Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn midpoints_round_away_from_zero() {
        assert_eq!(round_money(d("2.345")), d("2.35"));
        assert_eq!(round_money(d("2.344")), d("2.34"));
        assert_eq!(round_money(d("-2.345")), d("-2.35"));
    }

    #[test]
    fn percent_of_rounds_the_result() {
        assert_eq!(percent_of(d("1000"), d("10")), d("100.00"));
        assert_eq!(percent_of(d("333.33"), d("12.5")), d("41.67"));
    }
}
