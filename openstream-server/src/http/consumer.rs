//! Consumer group endpoints

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use openstream_core::{
    AckRequest, AckResponse, ClaimRequest, ClaimResponse, Operation, Principal, ReadRequest,
    ReadResponse,
};

use crate::{AppState, error::ApiError};

/// Read undelivered events for a group.
///
/// May wait up to `block_ms`. If the client disconnects, axum drops this
/// future and the pending engine call with it.
pub async fn read(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((topic, group)): Path<(String, String)>,
    Json(request): Json<ReadRequest>,
) -> Result<Json<ReadResponse>, ApiError> {
    principal.require(Operation::Read)?;
    Ok(Json(state.service.read(&topic, &group, &request).await?))
}

pub async fn ack(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((topic, group)): Path<(String, String)>,
    Json(request): Json<AckRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    principal.require(Operation::Ack)?;
    Ok(Json(state.service.ack(&topic, &group, &request).await?))
}

pub async fn claim(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((topic, group)): Path<(String, String)>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    principal.require(Operation::Claim)?;
    Ok(Json(state.service.claim(&topic, &group, &request).await?))
}
