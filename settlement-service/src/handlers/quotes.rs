//! Quote handlers: VAT totals for order and cart pricing.

use axum::Json;
use service_core::error::AppError;

use crate::domain::{
    cart_totals_from_inclusive_prices, order_totals_from_base_prices, OrderTotals, PricedQuantity,
};
use crate::dtos::QuoteRequest;

/// Totals for items priced tax-exclusive at source (order settlement).
pub async fn order_quote(
    Json(request): Json<QuoteRequest>,
) -> Result<Json<OrderTotals>, AppError> {
    let items: Vec<PricedQuantity> = request.items.into_iter().map(Into::into).collect();
    let totals = order_totals_from_base_prices(&items)?;
    Ok(Json(totals))
}

/// Totals for items priced tax-inclusive at source (storefront cart).
pub async fn cart_quote(Json(request): Json<QuoteRequest>) -> Result<Json<OrderTotals>, AppError> {
    let items: Vec<PricedQuantity> = request.items.into_iter().map(Into::into).collect();
    let totals = cart_totals_from_inclusive_prices(&items)?;
    Ok(Json(totals))
}
