//! Platform commission settings handlers.

use axum::{extract::State, Json};
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::UpdateCommissionSettingsRequest;
use crate::models::{PlatformSettings, UpdatePlatformSettings};
use crate::startup::AppState;

/// Current commission rates; defaults apply until settings are written.
pub async fn get_commission_settings(
    State(state): State<AppState>,
) -> Result<Json<PlatformSettings>, AppError> {
    let settings = state.db.get_platform_settings().await?;
    Ok(Json(settings))
}

#[tracing::instrument(skip(state, request))]
pub async fn update_commission_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateCommissionSettingsRequest>,
) -> Result<Json<PlatformSettings>, AppError> {
    request.validate()?;

    let updated = state
        .db
        .update_platform_settings(&UpdatePlatformSettings {
            brand_sales_commission: request.brand_sales_commission,
            store_rent_commission: request.store_rent_commission,
        })
        .await?;

    Ok(Json(updated))
}
