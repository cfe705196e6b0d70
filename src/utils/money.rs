use rust_decimal::{Decimal, RoundingStrategy};

// ============================================================================
// Monetary Rounding
// ============================================================================
//
// All customer-visible amounts carry two decimal places. Rounding is applied
// once, at the edge of a computation, never on intermediate sums.
//
// ============================================================================

const DECIMAL_PLACES: u32 = 2;

/// Round a monetary amount to two decimal places, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Line total for an itemized order line.
pub fn line_total(quantity: i32, unit_price: Decimal) -> Decimal {
    round2(Decimal::from(quantity) * unit_price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round2(dec!(2.344)), dec!(2.34));
        assert_eq!(round2(dec!(2.345)), dec!(2.35));
    }

    #[test]
    fn test_round2_is_stable_on_two_decimals() {
        assert_eq!(round2(dec!(300.00)), dec!(300.00));
        assert_eq!(round2(dec!(0)), dec!(0));
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(3, dec!(19.99)), dec!(59.97));
        assert_eq!(line_total(2, dec!(20)), dec!(40.00));
    }
}
