// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{info, warn};

use shared_models::error::AppError;

use crate::models::{OptimizationOutcome, OptimizeRequest, OptimizerStatusResponse};
use crate::services::optimizer::SlotOptimizer;

/// Ranked collection slots for a patient address.
#[axum::debug_handler]
pub async fn optimize_slots(
    State(optimizer): State<Arc<SlotOptimizer>>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Result<Json<OptimizationOutcome>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected optimization request body: {}", rejection);
        AppError::BadRequest(rejection.body_text())
    })?;

    info!("Slot optimization requested");

    let outcome = optimizer.optimize(&request.address).await?;

    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn optimizer_status(
    State(optimizer): State<Arc<SlotOptimizer>>,
) -> Json<OptimizerStatusResponse> {
    Json(OptimizerStatusResponse {
        state: optimizer.state(),
        is_loading: optimizer.is_loading(),
    })
}
