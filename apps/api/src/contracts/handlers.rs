//! Axum route handlers for the Contracts API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::contracts::models::{Contract, ContractStatus, MilestoneStatus, NewContract};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PartyQuery {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct MilestoneStatusUpdate {
    pub status: MilestoneStatus,
}

#[derive(Debug, Deserialize)]
pub struct ContractStatusUpdate {
    pub status: ContractStatus,
}

/// POST /api/v1/contracts
pub async fn handle_create_contract(
    State(state): State<AppState>,
    Json(request): Json<NewContract>,
) -> Result<(StatusCode, Json<Contract>), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    let contract = state.contracts.create_contract(request).await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

/// GET /api/v1/contracts?address=0x...
pub async fn handle_list_contracts(
    State(state): State<AppState>,
    Query(params): Query<PartyQuery>,
) -> Result<Json<Vec<Contract>>, AppError> {
    let contracts = state
        .contracts
        .list_contracts_for_party(&params.address)
        .await?;
    Ok(Json(contracts))
}

/// GET /api/v1/contracts/:id
pub async fn handle_get_contract(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Contract>, AppError> {
    Ok(Json(state.contracts.get_contract(&id).await?))
}

/// PATCH /api/v1/contracts/:id/milestones/:index
pub async fn handle_update_milestone(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
    Json(request): Json<MilestoneStatusUpdate>,
) -> Result<Json<Contract>, AppError> {
    let contract = state
        .contracts
        .update_milestone_status(&id, index, request.status)
        .await?;
    Ok(Json(contract))
}

/// PATCH /api/v1/contracts/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ContractStatusUpdate>,
) -> Result<Json<Contract>, AppError> {
    let contract = state
        .contracts
        .update_contract_status(&id, request.status)
        .await?;
    Ok(Json(contract))
}
