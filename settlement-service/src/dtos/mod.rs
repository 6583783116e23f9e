//! Request/response DTOs for the HTTP surface.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::{
    CommissionRates, InventoryLine, InventoryWarning, PricedQuantity, SettlementTotals,
};
use crate::models::{Clearance, ClearanceItem, CreateClearance, CreateClearanceItem};

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<QuoteItem>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QuoteItem {
    pub price: Decimal,
    pub quantity: i64,
}

impl From<QuoteItem> for PricedQuantity {
    fn from(item: QuoteItem) -> Self {
        PricedQuantity {
            price: item.price,
            quantity: item.quantity,
        }
    }
}

fn validate_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate < Decimal::ZERO || *rate > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("commission rate must be between 0 and 100"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommissionSettingsRequest {
    #[validate(custom(function = "validate_rate"))]
    pub brand_sales_commission: Decimal,
    #[validate(custom(function = "validate_rate"))]
    pub store_rent_commission: Decimal,
}

/// Preview request: inventory lines plus an optional explicit rate
/// snapshot. Current platform settings apply when no rates are given.
#[derive(Debug, Deserialize)]
pub struct SettlementPreviewRequest {
    pub items: Vec<InventoryLine>,
    #[serde(default)]
    pub rates: Option<CommissionRates>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClearanceRequest {
    pub rental_id: Uuid,
    pub store_name: String,
    pub brand_name: String,
    pub items: Vec<CreateClearanceItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClearanceItemRequest {
    pub product_id: String,
    pub product_name: String,
    #[serde(default)]
    pub localized_name: Option<String>,
    pub initial_quantity: i64,
    pub sold_quantity: i64,
    pub remaining_quantity: i64,
    pub unit_price: Decimal,
}

impl From<CreateClearanceRequest> for CreateClearance {
    fn from(request: CreateClearanceRequest) -> Self {
        CreateClearance {
            rental_id: request.rental_id,
            store_name: request.store_name,
            brand_name: request.brand_name,
            items: request
                .items
                .into_iter()
                .map(|item| CreateClearanceItem {
                    product_id: item.product_id,
                    product_name: item.product_name,
                    localized_name: item.localized_name,
                    initial_quantity: item.initial_quantity,
                    sold_quantity: item.sold_quantity,
                    remaining_quantity: item.remaining_quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClearanceResponse {
    pub clearance_id: Uuid,
    pub rental_id: Uuid,
    pub store_name: String,
    pub brand_name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementTotals>,
    pub items: Vec<ClearanceItem>,
    pub created_utc: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settled_utc: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_utc: Option<DateTime<Utc>>,
}

impl ClearanceResponse {
    pub fn from_record(clearance: Clearance, items: Vec<ClearanceItem>) -> Self {
        let settlement = clearance.settlement_totals();
        Self {
            clearance_id: clearance.clearance_id,
            rental_id: clearance.rental_id,
            store_name: clearance.store_name,
            brand_name: clearance.brand_name,
            status: clearance.status,
            settlement,
            items,
            created_utc: clearance.created_utc,
            settled_utc: clearance.settled_utc,
            approved_utc: clearance.approved_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettleClearanceResponse {
    #[serde(flatten)]
    pub clearance: ClearanceResponse,
    pub warnings: Vec<InventoryWarning>,
}
