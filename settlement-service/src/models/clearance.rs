//! Clearance record models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{InventoryLine, SettlementTotals};

/// Clearance workflow status. Most transitions belong to the surrounding
/// rental workflow; this service owns only the settlement steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearanceStatus {
    NotStarted,
    PendingInventoryCheck,
    PendingReturnShipment,
    ReturnShipped,
    ReturnReceived,
    PendingSettlement,
    SettlementApproved,
    PaymentCompleted,
    Closed,
}

impl ClearanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClearanceStatus::NotStarted => "not_started",
            ClearanceStatus::PendingInventoryCheck => "pending_inventory_check",
            ClearanceStatus::PendingReturnShipment => "pending_return_shipment",
            ClearanceStatus::ReturnShipped => "return_shipped",
            ClearanceStatus::ReturnReceived => "return_received",
            ClearanceStatus::PendingSettlement => "pending_settlement",
            ClearanceStatus::SettlementApproved => "settlement_approved",
            ClearanceStatus::PaymentCompleted => "payment_completed",
            ClearanceStatus::Closed => "closed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "pending_inventory_check" => ClearanceStatus::PendingInventoryCheck,
            "pending_return_shipment" => ClearanceStatus::PendingReturnShipment,
            "return_shipped" => ClearanceStatus::ReturnShipped,
            "return_received" => ClearanceStatus::ReturnReceived,
            "pending_settlement" => ClearanceStatus::PendingSettlement,
            "settlement_approved" => ClearanceStatus::SettlementApproved,
            "payment_completed" => ClearanceStatus::PaymentCompleted,
            "closed" => ClearanceStatus::Closed,
            _ => ClearanceStatus::NotStarted,
        }
    }
}

/// Clearance record. Settlement columns stay NULL until a settlement has
/// been computed; the record freezes once approved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Clearance {
    pub clearance_id: Uuid,
    pub rental_id: Uuid,
    pub store_name: String,
    pub brand_name: String,
    pub status: String,
    pub total_sales: Option<Decimal>,
    pub total_sales_with_tax: Option<Decimal>,
    pub platform_commission_rate: Option<Decimal>,
    pub store_commission_rate: Option<Decimal>,
    pub platform_commission_amount: Option<Decimal>,
    pub store_commission_amount: Option<Decimal>,
    pub store_payout_amount: Option<Decimal>,
    pub return_inventory_value: Option<Decimal>,
    pub brand_total_amount: Option<Decimal>,
    pub created_utc: DateTime<Utc>,
    pub settled_utc: Option<DateTime<Utc>>,
    pub approved_utc: Option<DateTime<Utc>>,
}

impl Clearance {
    /// The persisted settlement aggregate, if one has been computed.
    pub fn settlement_totals(&self) -> Option<SettlementTotals> {
        Some(SettlementTotals {
            total_sales: self.total_sales?,
            total_sales_with_tax: self.total_sales_with_tax?,
            platform_commission_rate: self.platform_commission_rate?,
            store_commission_rate: self.store_commission_rate?,
            platform_commission_amount: self.platform_commission_amount?,
            store_commission_amount: self.store_commission_amount?,
            store_payout_amount: self.store_payout_amount?,
            return_inventory_value: self.return_inventory_value?,
            brand_total_amount: self.brand_total_amount?,
        })
    }
}

/// Inventory reconciliation line belonging to a clearance.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClearanceItem {
    pub item_id: Uuid,
    pub clearance_id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub localized_name: Option<String>,
    pub initial_quantity: i64,
    pub sold_quantity: i64,
    pub remaining_quantity: i64,
    pub unit_price: Decimal,
    pub total_sales_value: Option<Decimal>,
    pub total_sales_with_tax: Option<Decimal>,
    pub sort_order: i32,
    pub created_utc: DateTime<Utc>,
}

impl ClearanceItem {
    pub fn to_inventory_line(&self) -> InventoryLine {
        InventoryLine {
            product_id: self.product_id.clone(),
            product_name: self.product_name.clone(),
            localized_name: self.localized_name.clone(),
            initial_quantity: self.initial_quantity,
            sold_quantity: self.sold_quantity,
            remaining_quantity: self.remaining_quantity,
            unit_price: self.unit_price,
        }
    }
}

/// Input for creating a clearance.
#[derive(Debug, Clone)]
pub struct CreateClearance {
    pub rental_id: Uuid,
    pub store_name: String,
    pub brand_name: String,
    pub items: Vec<CreateClearanceItem>,
}

/// Input for one inventory line of a new clearance.
#[derive(Debug, Clone)]
pub struct CreateClearanceItem {
    pub product_id: String,
    pub product_name: String,
    pub localized_name: Option<String>,
    pub initial_quantity: i64,
    pub sold_quantity: i64,
    pub remaining_quantity: i64,
    pub unit_price: Decimal,
}

impl CreateClearanceItem {
    pub fn to_inventory_line(&self) -> InventoryLine {
        InventoryLine {
            product_id: self.product_id.clone(),
            product_name: self.product_name.clone(),
            localized_name: self.localized_name.clone(),
            initial_quantity: self.initial_quantity,
            sold_quantity: self.sold_quantity,
            remaining_quantity: self.remaining_quantity,
            unit_price: self.unit_price,
        }
    }
}

/// Filter parameters for listing clearances.
#[derive(Debug, Clone)]
pub struct ListClearancesFilter {
    pub status: Option<ClearanceStatus>,
    pub limit: i64,
}

impl Default for ListClearancesFilter {
    fn default() -> Self {
        Self {
            status: None,
            limit: 50,
        }
    }
}
