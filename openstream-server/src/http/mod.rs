//! HTTP server module

mod admin;
mod api;
mod consumer;
mod producer;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::middleware::{auth_middleware, track_duration};

pub use api::{HealthResponse, TokenRequest, TokenResponse};

/// Create the HTTP router with all routes configured
///
/// Everything under `/v1` except token minting requires a bearer token.
pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/v1/topics/:topic/events", post(producer::ingest))
        .route("/v1/topics/:topic/groups", post(admin::create_group))
        .route("/v1/topics/:topic/groups/:group/read", post(consumer::read))
        .route("/v1/topics/:topic/groups/:group/ack", post(consumer::ack))
        .route("/v1/topics/:topic/groups/:group/claim", post(consumer::claim))
        .route("/v1/topics/:topic/groups/:group/reset", post(admin::reset_group))
        .route("/v1/topics/:topic/describe", get(admin::describe_topic))
        .route("/v1/metrics/summary", get(admin::summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/healthz", get(api::healthz))
        .route("/metrics", get(api::metrics))
        .route("/metrics/", get(api::metrics))
        .route("/v1/auth/token", post(api::mint_token))
        .merge(protected)
        .route_layer(middleware::from_fn(track_duration))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
