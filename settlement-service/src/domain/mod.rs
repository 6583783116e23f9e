//! Pure settlement and tax calculation core.
//!
//! No I/O, no clock, no shared state: identical inputs always produce
//! identical outputs. Commission rates are snapshotted by the caller and
//! passed in, never read mid-calculation.

mod error;
mod money;
mod settlement;
mod tax;

pub use error::CalculationError;
pub use money::{round2, VAT_FACTOR, VAT_RATE};
pub use settlement::{
    settle, CommissionRates, InventoryLine, InventoryWarning, SettledLine, Settlement,
    SettlementTotals,
};
pub use tax::{
    cart_totals_from_inclusive_prices, order_totals_from_base_prices, price_with_tax, OrderTotals,
    PricedQuantity,
};
