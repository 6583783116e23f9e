//! Platform commission settings model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain::CommissionRates;

/// Default brand sales commission (percent) before any settings record
/// exists.
pub const DEFAULT_BRAND_SALES_COMMISSION: Decimal = Decimal::from_parts(8, 0, 0, false, 0);

/// Default store rent commission (percent).
pub const DEFAULT_STORE_RENT_COMMISSION: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Platform-wide commission configuration. A missing record is the normal
/// first-run state and is answered with the documented defaults.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlatformSettings {
    pub brand_sales_commission: Decimal,
    pub store_rent_commission: Decimal,
    pub updated_utc: Option<DateTime<Utc>>,
}

impl PlatformSettings {
    /// Settings answered when no record has been written yet.
    pub fn first_run() -> Self {
        Self {
            brand_sales_commission: DEFAULT_BRAND_SALES_COMMISSION,
            store_rent_commission: DEFAULT_STORE_RENT_COMMISSION,
            updated_utc: None,
        }
    }

    /// Snapshot of the rates for a single settlement computation.
    pub fn rates(&self) -> CommissionRates {
        CommissionRates {
            platform_rate: self.brand_sales_commission,
            store_rate: self.store_rent_commission,
        }
    }
}

/// Input for updating platform settings.
#[derive(Debug, Clone)]
pub struct UpdatePlatformSettings {
    pub brand_sales_commission: Decimal,
    pub store_rent_commission: Decimal,
}
