//! Health, metrics exposition and token minting

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use openstream_core::{Role, StreamError, validate};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
}

/// Liveness probe. Does not touch the log engine.
pub async fn healthz(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenRequest {
    pub sub: String,
    pub role: Role,
    pub admin_secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
}

/// Mint a bearer token, guarded by the shared admin secret
pub async fn mint_token(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    validate::text("sub", &request.sub, 1, validate::MAX_NAME_LEN)?;
    if request.admin_secret.is_empty() {
        return Err(StreamError::Validation("admin_secret must not be empty".into()).into());
    }

    let token = state
        .tokens
        .mint(&request.admin_secret, &request.sub, request.role)?;
    tracing::info!(sub = %request.sub, role = %request.role, "Minted token");

    Ok(Json(TokenResponse {
        token,
        token_type: "bearer".to_string(),
    }))
}
