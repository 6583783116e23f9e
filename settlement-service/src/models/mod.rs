//! Persisted models for settlement-service.

mod clearance;
mod settings;

pub use clearance::{
    Clearance, ClearanceItem, ClearanceStatus, CreateClearance, CreateClearanceItem,
    ListClearancesFilter,
};
pub use settings::{
    PlatformSettings, UpdatePlatformSettings, DEFAULT_BRAND_SALES_COMMISSION,
    DEFAULT_STORE_RENT_COMMISSION,
};
