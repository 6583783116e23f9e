//! Settlement preview handler.

use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::domain::{self, Settlement};
use crate::dtos::SettlementPreviewRequest;
use crate::services::metrics::SETTLEMENTS_TOTAL;
use crate::startup::AppState;

/// Compute a settlement without persisting anything. Rates come from the
/// request when given, otherwise from one snapshot of the current platform
/// settings.
#[tracing::instrument(skip(state, request))]
pub async fn preview_settlement(
    State(state): State<AppState>,
    Json(request): Json<SettlementPreviewRequest>,
) -> Result<Json<Settlement>, AppError> {
    let rates = match request.rates {
        Some(rates) => rates,
        None => state.db.get_platform_settings().await?.rates(),
    };

    let settlement = domain::settle(&request.items, rates)?;

    SETTLEMENTS_TOTAL.with_label_values(&["preview"]).inc();

    Ok(Json(settlement))
}
