//! OpenStream serve command
//!
//! Connects to Redis, installs the Prometheus recorder and runs the HTTP
//! server in the foreground until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use openstream_log::RedisLogEngine;
use openstream_server::{AppState, OpenStreamServer, ServerConfig};
use tracing::{info, warn};

use crate::config::OpenStreamConfig;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Host to bind to (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Run the serve command
pub async fn run(args: ServeArgs, config: OpenStreamConfig) -> Result<()> {
    let server_config = server_config(&args, &config);

    if config.auth.uses_dev_secrets() {
        warn!("Built-in development secrets are in use; set OPENSTREAM_JWT_SECRET and OPENSTREAM_ADMIN_SECRET");
    }

    let engine = RedisLogEngine::new(config.engine.clone())
        .with_context(|| format!("Invalid Redis URL {}", config.engine.redis_url))?;
    if let Err(e) = engine.ping().await {
        warn!(error = %e, "Redis is not reachable yet; requests will fail until it is");
    }

    let prometheus = openstream_server::metrics::install_recorder()?;
    let state = AppState::from_engine(Arc::new(engine), config.stream, config.auth)
        .with_prometheus(prometheus);

    info!(
        "Starting OpenStream server on {}:{}",
        server_config.host, server_config.port
    );
    OpenStreamServer::new(server_config, state).run().await?;
    Ok(())
}

fn server_config(args: &ServeArgs, config: &OpenStreamConfig) -> ServerConfig {
    ServerConfig {
        host: args.host.clone().unwrap_or_else(|| config.server.host.clone()),
        port: args.port.unwrap_or(config.server.port),
        cors_allow_origins: config.server.cors_allow_origins.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let config = OpenStreamConfig::default();
        let args = ServeArgs {
            host: Some("127.0.0.1".to_string()),
            port: Some(9001),
        };

        let server = server_config(&args, &config);

        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 9001);
        assert_eq!(server.cors_allow_origins, config.server.cors_allow_origins);
    }

    #[test]
    fn test_config_used_without_flags() {
        let mut config = OpenStreamConfig::default();
        config.server.port = 8123;
        let args = ServeArgs {
            host: None,
            port: None,
        };

        let server = server_config(&args, &config);

        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8123);
    }
}
