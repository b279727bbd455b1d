//! Currency amount helpers.

use rust_decimal::{Decimal, RoundingStrategy};

/// Largest debit/credit difference still accepted as balanced (0.01 currency units).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Round to two decimal places, half away from zero.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `|a - b| <= tolerance`.
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn tolerance_is_one_cent() {
        assert_eq!(BALANCE_TOLERANCE, dec!(0.01));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_currency(dec!(10.005)), dec!(10.01));
        assert_eq!(round_currency(dec!(-10.005)), dec!(-10.01));
        assert_eq!(round_currency(dec!(10.004)), dec!(10.00));
    }

    #[test]
    fn tolerance_is_inclusive() {
        assert!(within_tolerance(dec!(100.00), dec!(99.99), BALANCE_TOLERANCE));
        assert!(!within_tolerance(dec!(100.00), dec!(99.98), BALANCE_TOLERANCE));
    }
}
