//! openstream-server - HTTP surface for OpenStream
//!
//! Exposes the coordination layer from `openstream-core` as a JSON REST API
//! with bearer-token auth, CORS and Prometheus metrics.

mod error;
pub mod http;
pub mod metrics;
pub mod middleware;
mod state;

use std::sync::Arc;

use axum::{Router, http::HeaderValue};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use error::{ApiError, ServerError};
pub use http::create_router;
pub use middleware::auth_middleware;
pub use state::AppState;

/// The OpenStream HTTP server
pub struct OpenStreamServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl OpenStreamServer {
    /// Create a server over the given state
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Router with CORS applied
    pub fn app(&self) -> Router {
        create_router(self.state()).layer(cors_layer(&self.config.cors_allow_origins))
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("OpenStream server listening on {}", addr);
        self.run_with_listener(listener).await
    }

    /// Run the server on an already-bound listener until Ctrl-C
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        axum::serve(listener, self.app())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        tracing::info!("OpenStream server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// CORS for browser dashboards. Unparsable origins are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Origins allowed to call the API from a browser
    pub cors_allow_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_allow_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Parse a comma-separated origin list, dropping blanks
    pub fn with_cors_origins(mut self, origins: &str) -> Self {
        self.cors_allow_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    /// Returns the socket address string (e.g., "0.0.0.0:8000")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
