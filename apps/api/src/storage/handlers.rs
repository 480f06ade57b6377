use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::state::AppState;
use crate::storage::VerificationResult;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub payload: Value,
}

/// GET /api/v1/snapshots/:identifier
pub async fn handle_get_snapshot(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.snapshots.retrieve(&identifier).await?))
}

/// POST /api/v1/snapshots/:identifier/verify
pub async fn handle_verify_snapshot(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerificationResult>, AppError> {
    Ok(Json(
        state.snapshots.verify(&identifier, &request.payload).await?,
    ))
}
