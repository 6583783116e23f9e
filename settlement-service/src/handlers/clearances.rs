//! Clearance lifecycle handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::{ClearanceResponse, CreateClearanceRequest, SettleClearanceResponse};
use crate::models::{Clearance, ClearanceStatus, ListClearancesFilter};
use crate::startup::AppState;

#[tracing::instrument(skip(state, request), fields(rental_id = %request.rental_id))]
pub async fn create_clearance(
    State(state): State<AppState>,
    Json(request): Json<CreateClearanceRequest>,
) -> Result<(StatusCode, Json<ClearanceResponse>), AppError> {
    let (clearance, items) = state.db.create_clearance(&request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ClearanceResponse::from_record(clearance, items)),
    ))
}

pub async fn get_clearance(
    State(state): State<AppState>,
    Path(clearance_id): Path<Uuid>,
) -> Result<Json<ClearanceResponse>, AppError> {
    let (clearance, items) = state
        .db
        .get_clearance(clearance_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Clearance {} not found", clearance_id)))?;

    Ok(Json(ClearanceResponse::from_record(clearance, items)))
}

#[derive(Debug, Deserialize)]
pub struct ListClearancesQuery {
    pub status: Option<ClearanceStatus>,
    pub limit: Option<i64>,
}

pub async fn list_clearances(
    State(state): State<AppState>,
    Query(query): Query<ListClearancesQuery>,
) -> Result<Json<Vec<Clearance>>, AppError> {
    let filter = ListClearancesFilter {
        status: query.status,
        limit: query.limit.unwrap_or(50).clamp(1, 200),
    };
    let clearances = state.db.list_clearances(&filter).await?;
    Ok(Json(clearances))
}

/// Compute and persist the settlement for a pending clearance. Warnings
/// about unreconciled inventory lines ride along in the response.
#[tracing::instrument(skip(state))]
pub async fn settle_clearance(
    State(state): State<AppState>,
    Path(clearance_id): Path<Uuid>,
) -> Result<Json<SettleClearanceResponse>, AppError> {
    let (clearance, items, warnings) = state.db.settle_clearance(clearance_id).await?;
    Ok(Json(SettleClearanceResponse {
        clearance: ClearanceResponse::from_record(clearance, items),
        warnings,
    }))
}

/// Freeze a settled clearance. Settle and approve both conflict afterwards.
#[tracing::instrument(skip(state))]
pub async fn approve_clearance(
    State(state): State<AppState>,
    Path(clearance_id): Path<Uuid>,
) -> Result<Json<ClearanceResponse>, AppError> {
    let approved = state.db.approve_clearance(clearance_id).await?;
    let items = state
        .db
        .get_clearance(clearance_id)
        .await?
        .map(|(_, items)| items)
        .unwrap_or_default();

    Ok(Json(ClearanceResponse::from_record(approved, items)))
}
