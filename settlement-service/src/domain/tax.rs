//! VAT conversion between tax-exclusive and tax-inclusive amounts.
//!
//! Two pricing regimes exist side by side: order settlement stores
//! tax-exclusive prices, the storefront cart stores tax-inclusive prices.
//! They are deliberately separate entry points. Unifying them (or moving the
//! per-line rounding after the sum) would change totals already persisted
//! for historical orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::CalculationError;
use super::money::{ensure_price, ensure_quantity, round2, VAT_FACTOR, VAT_RATE};

/// A price together with the quantity it applies to. Whether `price` is
/// tax-exclusive or tax-inclusive depends on the entry point.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PricedQuantity {
    pub price: Decimal,
    pub quantity: i64,
}

/// Totals for an order or cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Tax-inclusive price for a tax-exclusive base price.
pub fn price_with_tax(base_price: Decimal) -> Result<Decimal, CalculationError> {
    ensure_price("base_price", base_price)?;
    Ok(round2(base_price * VAT_FACTOR))
}

/// Totals for items priced tax-exclusive at source (order settlement and
/// migrated records). Each line is rounded before summing so the subtotal
/// matches what a receipt shows line by line.
pub fn order_totals_from_base_prices(
    items: &[PricedQuantity],
) -> Result<OrderTotals, CalculationError> {
    let mut subtotal = Decimal::ZERO;
    for item in items {
        ensure_price("base_price", item.price)?;
        ensure_quantity("quantity", item.quantity)?;
        subtotal += round2(item.price * Decimal::from(item.quantity));
    }

    let tax = round2(subtotal * VAT_RATE);
    let total = round2(subtotal + tax);
    Ok(OrderTotals {
        subtotal,
        tax,
        total,
    })
}

/// Totals for items already priced tax-inclusive at source (the storefront
/// cart). The subtotal and tax are backed out of the inclusive total.
pub fn cart_totals_from_inclusive_prices(
    items: &[PricedQuantity],
) -> Result<OrderTotals, CalculationError> {
    let mut total = Decimal::ZERO;
    for item in items {
        ensure_price("inclusive_price", item.price)?;
        ensure_quantity("quantity", item.quantity)?;
        total += round2(item.price * Decimal::from(item.quantity));
    }

    let subtotal = round2(total / VAT_FACTOR);
    let tax = round2(total - subtotal);
    Ok(OrderTotals {
        subtotal,
        tax,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).expect("invalid decimal literal")
    }

    fn item(price: &str, quantity: i64) -> PricedQuantity {
        PricedQuantity {
            price: dec(price),
            quantity,
        }
    }

    #[test]
    fn test_price_with_tax() {
        assert_eq!(price_with_tax(dec("100")).unwrap(), dec("115"));
        assert_eq!(price_with_tax(dec("0")).unwrap(), dec("0"));
        assert_eq!(price_with_tax(dec("86.96")).unwrap(), dec("100.00"));
    }

    #[test]
    fn test_price_with_tax_rejects_negative() {
        let err = price_with_tax(dec("-1")).unwrap_err();
        assert_eq!(
            err,
            CalculationError::NegativePrice {
                field: "base_price",
                value: dec("-1"),
            }
        );
    }

    #[test]
    fn test_order_totals_empty() {
        let totals = order_totals_from_base_prices(&[]).unwrap();
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_order_totals_single_line() {
        let totals = order_totals_from_base_prices(&[item("10", 3)]).unwrap();
        assert_eq!(totals.subtotal, dec("30"));
        assert_eq!(totals.tax, dec("4.5"));
        assert_eq!(totals.total, dec("34.5"));
    }

    #[test]
    fn test_order_totals_round_each_line_before_summing() {
        // Two lines of 1.015 each: rounded per line (1.02 + 1.02 = 2.04),
        // not rounded after the sum (2.03).
        let totals =
            order_totals_from_base_prices(&[item("1.015", 1), item("1.015", 1)]).unwrap();
        assert_eq!(totals.subtotal, dec("2.04"));
    }

    #[test]
    fn test_order_totals_rejects_negative_quantity() {
        let err = order_totals_from_base_prices(&[item("10", -1)]).unwrap_err();
        assert_eq!(
            err,
            CalculationError::NegativeQuantity {
                field: "quantity",
                value: -1,
            }
        );
    }

    #[test]
    fn test_cart_totals_single_line() {
        let totals = cart_totals_from_inclusive_prices(&[item("115", 1)]).unwrap();
        assert_eq!(totals.subtotal, dec("100"));
        assert_eq!(totals.tax, dec("15"));
        assert_eq!(totals.total, dec("115"));
    }

    #[test]
    fn test_cart_totals_empty() {
        let totals = cart_totals_from_inclusive_prices(&[]).unwrap();
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_inclusive_exclusive_round_trip_is_lossy() {
        // 0.50 inclusive backs out to 0.43 exclusive, which re-includes to
        // 0.49. Accepted double-rounding loss, not a defect.
        let exclusive = round2(dec("0.50") / VAT_FACTOR);
        assert_eq!(exclusive, dec("0.43"));
        assert_eq!(price_with_tax(exclusive).unwrap(), dec("0.49"));
    }
}
