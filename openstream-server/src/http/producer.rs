//! Producer endpoints

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use openstream_core::{IngestRequest, IngestResponse, Operation, Principal};

use crate::{AppState, error::ApiError};

/// Append a batch of events to a topic
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(topic): Path<String>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    principal.require(Operation::Ingest)?;
    Ok(Json(state.service.ingest(&topic, &request).await?))
}
