//! Group administration and topic inspection endpoints

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use openstream_core::{
    GroupCreateRequest, GroupCreated, GroupReset, GroupResetRequest, Operation, Principal,
    Summary, TopicDescription,
};

use crate::{AppState, error::ApiError};

pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(topic): Path<String>,
    Json(request): Json<GroupCreateRequest>,
) -> Result<Json<GroupCreated>, ApiError> {
    principal.require(Operation::CreateGroup)?;
    Ok(Json(state.service.create_group(&topic, &request).await?))
}

/// Move a group's cursor for replay (`0-0`) or skip-ahead (`$`)
pub async fn reset_group(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((topic, group)): Path<(String, String)>,
    Json(request): Json<GroupResetRequest>,
) -> Result<Json<GroupReset>, ApiError> {
    principal.require(Operation::ResetGroup)?;
    Ok(Json(state.service.reset_group(&topic, &group, &request).await?))
}

pub async fn describe_topic(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(topic): Path<String>,
) -> Result<Json<TopicDescription>, ApiError> {
    principal.require(Operation::Describe)?;
    Ok(Json(state.service.describe_topic(&topic).await?))
}

/// Per-partition lengths and group bookkeeping for dashboards
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Summary>, ApiError> {
    principal.require(Operation::Summary)?;
    Ok(Json(state.service.summary().await?))
}
