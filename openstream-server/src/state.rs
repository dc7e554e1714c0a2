//! Shared application state for the OpenStream server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use openstream_core::{AuthConfig, StreamConfig, StreamService, TokenService};
use openstream_log::{InMemoryLogEngine, LogEngine};

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Coordination layer over the log engine
    pub service: StreamService,
    /// Bearer token issuance and validation
    pub tokens: Arc<TokenService>,
    /// Renders `/metrics`; `None` when no recorder is installed
    pub prometheus: Option<PrometheusHandle>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: StreamService, tokens: TokenService) -> Self {
        Self {
            service,
            tokens: Arc::new(tokens),
            prometheus: None,
            started_at: Utc::now(),
        }
    }

    /// Build state over `engine` with the given stream and auth settings
    pub fn from_engine(engine: Arc<dyn LogEngine>, stream: StreamConfig, auth: AuthConfig) -> Self {
        Self::new(StreamService::new(engine, stream), TokenService::new(auth))
    }

    /// In-memory engine with default settings (for testing)
    pub fn in_memory() -> Self {
        Self::from_engine(
            Arc::new(InMemoryLogEngine::default()),
            StreamConfig::default(),
            AuthConfig::default(),
        )
    }

    /// Attach the Prometheus handle used by `/metrics`
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
