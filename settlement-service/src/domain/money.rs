//! Monetary primitives shared by the tax and settlement calculators.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::CalculationError;

/// VAT rate applied to all sales (15%).
pub const VAT_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Multiplier converting a tax-exclusive amount to its tax-inclusive
/// equivalent (1.15).
pub const VAT_FACTOR: Decimal = Decimal::from_parts(115, 0, 0, false, 2);

/// Round a monetary amount to 2 decimal places, half away from zero.
///
/// Every monetary result goes through this exact rounding. Per-line values
/// are rounded before they are summed; persisted settlements depend on that
/// order of operations.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub(super) fn ensure_price(field: &'static str, value: Decimal) -> Result<(), CalculationError> {
    if value < Decimal::ZERO {
        return Err(CalculationError::NegativePrice { field, value });
    }
    Ok(())
}

pub(super) fn ensure_quantity(field: &'static str, value: i64) -> Result<(), CalculationError> {
    if value < 0 {
        return Err(CalculationError::NegativeQuantity { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).expect("invalid decimal literal")
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec("1.015")), dec("1.02"));
        assert_eq!(round2(dec("1.025")), dec("1.03"));
        assert_eq!(round2(dec("1.024")), dec("1.02"));
    }

    #[test]
    fn test_round2_leaves_short_scales_alone() {
        assert_eq!(round2(dec("30")), dec("30"));
        assert_eq!(round2(dec("4.5")), dec("4.5"));
    }
}
