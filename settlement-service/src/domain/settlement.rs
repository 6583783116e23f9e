//! Clearance settlement: reconcile a rental's inventory lines into sales
//! values, commission splits, VAT-inclusive totals, and the store payout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::CalculationError;
use super::money::{ensure_price, ensure_quantity, round2, VAT_FACTOR};

/// One product's reconciliation line at rental clearance: what was placed on
/// the shelf, what sold, what is going back to the brand.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryLine {
    pub product_id: String,
    pub product_name: String,
    #[serde(default)]
    pub localized_name: Option<String>,
    pub initial_quantity: i64,
    pub sold_quantity: i64,
    pub remaining_quantity: i64,
    /// Tax-exclusive base price per unit.
    pub unit_price: Decimal,
}

impl InventoryLine {
    pub fn validate(&self) -> Result<(), CalculationError> {
        ensure_quantity("initial_quantity", self.initial_quantity)?;
        ensure_quantity("sold_quantity", self.sold_quantity)?;
        ensure_quantity("remaining_quantity", self.remaining_quantity)?;
        ensure_price("unit_price", self.unit_price)
    }

    fn quantities_reconcile(&self) -> bool {
        self.initial_quantity == self.sold_quantity + self.remaining_quantity
    }
}

/// Commission rates in percent. Range is enforced where settings are
/// written; the calculator applies whatever snapshot it is handed, 0 and
/// 100 included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRates {
    pub platform_rate: Decimal,
    pub store_rate: Decimal,
}

/// Per-line derived sales values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettledLine {
    pub product_id: String,
    pub total_sales_value: Decimal,
    pub total_sales_with_tax: Decimal,
}

/// Data-quality warning for a line whose quantities do not reconcile
/// (`initial != sold + remaining`). The line still settles on the
/// quantities as given; nothing is silently corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryWarning {
    pub product_id: String,
    pub initial_quantity: i64,
    pub sold_quantity: i64,
    pub remaining_quantity: i64,
}

/// Aggregate settlement for one clearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementTotals {
    pub total_sales: Decimal,
    pub total_sales_with_tax: Decimal,
    pub platform_commission_rate: Decimal,
    pub store_commission_rate: Decimal,
    pub platform_commission_amount: Decimal,
    pub store_commission_amount: Decimal,
    pub store_payout_amount: Decimal,
    pub return_inventory_value: Decimal,
    pub brand_total_amount: Decimal,
}

/// Result of settling a clearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub totals: SettlementTotals,
    pub lines: Vec<SettledLine>,
    pub warnings: Vec<InventoryWarning>,
}

/// Settle a clearance: per-line sales values, aggregates, commission
/// amounts, and the store payout.
///
/// An empty line list settles to all-zero totals. `total_sales_with_tax` is
/// the sum of already-rounded per-line values and may differ by a cent from
/// `round2(total_sales * 1.15)`; the two are never reconciled, matching
/// previously persisted settlements.
pub fn settle(
    lines: &[InventoryLine],
    rates: CommissionRates,
) -> Result<Settlement, CalculationError> {
    for line in lines {
        line.validate()?;
    }

    let mut settled = Vec::with_capacity(lines.len());
    let mut warnings = Vec::new();
    let mut total_sales = Decimal::ZERO;
    let mut total_sales_with_tax = Decimal::ZERO;
    let mut return_value = Decimal::ZERO;

    for line in lines {
        let total_sales_value = round2(line.unit_price * Decimal::from(line.sold_quantity));
        let line_with_tax = round2(total_sales_value * VAT_FACTOR);

        total_sales += total_sales_value;
        total_sales_with_tax += line_with_tax;
        // Returned stock is valued untaxed and summed before rounding.
        return_value += line.unit_price * Decimal::from(line.remaining_quantity);

        if !line.quantities_reconcile() {
            warnings.push(InventoryWarning {
                product_id: line.product_id.clone(),
                initial_quantity: line.initial_quantity,
                sold_quantity: line.sold_quantity,
                remaining_quantity: line.remaining_quantity,
            });
        }

        settled.push(SettledLine {
            product_id: line.product_id.clone(),
            total_sales_value,
            total_sales_with_tax: line_with_tax,
        });
    }

    let platform_commission_amount =
        round2(total_sales * rates.platform_rate / Decimal::ONE_HUNDRED);
    let store_commission_amount = round2(total_sales * rates.store_rate / Decimal::ONE_HUNDRED);
    // The store earns its commission on sales, not a share of the tax.
    let store_payout_amount = store_commission_amount;
    let brand_total_amount =
        round2(total_sales - platform_commission_amount - store_commission_amount);

    Ok(Settlement {
        totals: SettlementTotals {
            total_sales,
            total_sales_with_tax,
            platform_commission_rate: rates.platform_rate,
            store_commission_rate: rates.store_rate,
            platform_commission_amount,
            store_commission_amount,
            store_payout_amount,
            return_inventory_value: round2(return_value),
            brand_total_amount,
        },
        lines: settled,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).expect("invalid decimal literal")
    }

    fn rates(platform: &str, store: &str) -> CommissionRates {
        CommissionRates {
            platform_rate: dec(platform),
            store_rate: dec(store),
        }
    }

    fn line(product_id: &str, unit_price: &str, initial: i64, sold: i64, remaining: i64) -> InventoryLine {
        InventoryLine {
            product_id: product_id.to_string(),
            product_name: format!("Product {}", product_id),
            localized_name: None,
            initial_quantity: initial,
            sold_quantity: sold,
            remaining_quantity: remaining,
            unit_price: dec(unit_price),
        }
    }

    #[test]
    fn test_settle_single_line() {
        let settlement =
            settle(&[line("p1", "100", 10, 5, 5)], rates("8", "10")).unwrap();

        let totals = &settlement.totals;
        assert_eq!(totals.total_sales, dec("500"));
        assert_eq!(totals.total_sales_with_tax, dec("575"));
        assert_eq!(totals.platform_commission_amount, dec("40"));
        assert_eq!(totals.store_commission_amount, dec("50"));
        assert_eq!(totals.store_payout_amount, dec("50"));
        assert_eq!(totals.brand_total_amount, dec("410"));
        assert_eq!(totals.return_inventory_value, dec("500"));
        assert!(settlement.warnings.is_empty());
    }

    #[test]
    fn test_settle_empty_lines_is_all_zero() {
        let settlement = settle(&[], rates("8", "10")).unwrap();

        assert_eq!(settlement.totals.total_sales, Decimal::ZERO);
        assert_eq!(settlement.totals.total_sales_with_tax, Decimal::ZERO);
        assert_eq!(settlement.totals.platform_commission_amount, Decimal::ZERO);
        assert_eq!(settlement.totals.store_payout_amount, Decimal::ZERO);
        assert_eq!(settlement.totals.brand_total_amount, Decimal::ZERO);
        assert!(settlement.lines.is_empty());
        assert!(settlement.warnings.is_empty());
    }

    #[test]
    fn test_settle_is_deterministic() {
        let lines = [
            line("p1", "19.99", 20, 7, 13),
            line("p2", "3.35", 50, 11, 39),
        ];
        let first = settle(&lines, rates("8", "10")).unwrap();
        let second = settle(&lines, rates("8", "10")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_settle_sums_rounded_per_line_tax() {
        // Two lines of 0.02 sold once each: per-line tax-inclusive values
        // round to 0.02, summing to 0.04, while rounding the aggregate
        // (0.04 * 1.15 = 0.046) would give 0.05. The per-line sum wins.
        let settlement = settle(
            &[line("p1", "0.02", 1, 1, 0), line("p2", "0.02", 1, 1, 0)],
            rates("8", "10"),
        )
        .unwrap();

        assert_eq!(settlement.totals.total_sales, dec("0.04"));
        assert_eq!(settlement.totals.total_sales_with_tax, dec("0.04"));
        assert_ne!(
            settlement.totals.total_sales_with_tax,
            round2(settlement.totals.total_sales * VAT_FACTOR)
        );
    }

    #[test]
    fn test_settle_monotonic_in_sold_quantity() {
        let mut previous = Decimal::MIN;
        for sold in 0..=10 {
            let settlement =
                settle(&[line("p1", "33.35", 10, sold, 10 - sold)], rates("8", "10")).unwrap();
            assert!(settlement.totals.total_sales >= previous);
            assert!(settlement.totals.platform_commission_amount <= settlement.totals.total_sales);
            previous = settlement.totals.total_sales;
        }
    }

    #[test]
    fn test_settle_commission_rate_boundaries() {
        let zero = settle(&[line("p1", "100", 10, 5, 5)], rates("0", "0")).unwrap();
        assert_eq!(zero.totals.platform_commission_amount, Decimal::ZERO);
        assert_eq!(zero.totals.store_commission_amount, Decimal::ZERO);
        assert_eq!(zero.totals.brand_total_amount, dec("500"));

        let full = settle(&[line("p1", "100", 10, 5, 5)], rates("100", "0")).unwrap();
        assert_eq!(full.totals.platform_commission_amount, dec("500"));
        assert_eq!(full.totals.brand_total_amount, Decimal::ZERO);
    }

    #[test]
    fn test_settle_flags_unreconciled_quantities() {
        // 10 != 5 + 3: warned, not corrected - the line settles as given.
        let settlement =
            settle(&[line("p1", "100", 10, 5, 3)], rates("8", "10")).unwrap();

        assert_eq!(settlement.warnings.len(), 1);
        let warning = &settlement.warnings[0];
        assert_eq!(warning.product_id, "p1");
        assert_eq!(warning.initial_quantity, 10);
        assert_eq!(warning.sold_quantity, 5);
        assert_eq!(warning.remaining_quantity, 3);
        assert_eq!(settlement.totals.total_sales, dec("500"));
        assert_eq!(settlement.totals.return_inventory_value, dec("300"));
    }

    #[test]
    fn test_settle_rejects_negative_price() {
        let err = settle(&[line("p1", "-5", 10, 5, 5)], rates("8", "10")).unwrap_err();
        assert_eq!(
            err,
            CalculationError::NegativePrice {
                field: "unit_price",
                value: dec("-5"),
            }
        );
    }

    #[test]
    fn test_settle_rejects_negative_quantity() {
        let err = settle(&[line("p1", "5", 10, -2, 12)], rates("8", "10")).unwrap_err();
        assert_eq!(
            err,
            CalculationError::NegativeQuantity {
                field: "sold_quantity",
                value: -2,
            }
        );
    }

    #[test]
    fn test_settle_commission_rounding() {
        // 3 units at 33.35: sales 100.05; 8% = 8.004 rounds to 8.00,
        // 10% = 10.005 rounds half away from zero to 10.01.
        let settlement =
            settle(&[line("p1", "33.35", 3, 3, 0)], rates("8", "10")).unwrap();

        assert_eq!(settlement.totals.total_sales, dec("100.05"));
        assert_eq!(settlement.totals.platform_commission_amount, dec("8.00"));
        assert_eq!(settlement.totals.store_commission_amount, dec("10.01"));
        assert_eq!(settlement.totals.brand_total_amount, dec("82.04"));
    }
}
