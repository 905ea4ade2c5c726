//! Evaluation handler

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;
use tracing::debug;
use validator::Validate;

use domain_pricing::EvaluationResult;

use crate::dto::EvaluateRequest;
use crate::error::ApiError;
use crate::handlers::parse_business_id;
use crate::AppState;

/// Prices a quote scenario for a business
pub async fn evaluate(
    State(state): State<AppState>,
    Path(business_id): Path<String>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<EvaluationResult>, ApiError> {
    let business_id = parse_business_id(&business_id)?;
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    request.validate()?;

    let scenario = request.into_scenario(Utc::now().date_naive())?;
    let result = state.service.evaluate(&scenario, business_id).await?;

    debug!(
        %business_id,
        adjusted_total = %result.adjusted_total,
        serviceable = result.zone_resolved.serviceable,
        "Quote priced"
    );
    Ok(Json(result))
}
