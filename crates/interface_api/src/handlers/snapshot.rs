//! Snapshot inspection handlers

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::dto::SnapshotResponse;
use crate::error::ApiError;
use crate::handlers::parse_business_id;
use crate::AppState;

/// Returns the snapshot the next evaluation would use, loading it if needed
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(business_id): Path<String>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let business_id = parse_business_id(&business_id)?;
    let handle = state.service.snapshots().get(business_id).await?;
    Ok(Json(SnapshotResponse::new(&handle.snapshot, handle.stale)))
}

/// Reloads a business's snapshot immediately
pub async fn refresh_snapshot(
    State(state): State<AppState>,
    Path(business_id): Path<String>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let business_id = parse_business_id(&business_id)?;
    let snapshot = state.service.snapshots().refresh(business_id).await?;
    info!(%business_id, version = snapshot.version, "Snapshot refreshed on request");
    Ok(Json(SnapshotResponse::new(&snapshot, false)))
}
