use std::fmt;
use std::str::FromStr;

use openstream_core::{AuthConfig, StreamConfig};
use openstream_log::EngineConfig;
use serde::{Deserialize, Serialize};

/// Default host for the OpenStream server
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port for the OpenStream server
pub const DEFAULT_PORT: u16 = 8000;

/// Default browser origin allowed by CORS
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

const REDACTED: &str = "<redacted>";

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawOpenStreamConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub engine: RawEngineConfig,

    #[serde(default)]
    pub stream: RawStreamConfig,

    #[serde(default)]
    pub auth: RawAuthConfig,

    #[serde(default)]
    pub logging: RawLoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_allow_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawEngineConfig {
    pub redis_url: Option<String>,
    pub blocking_pool_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStreamConfig {
    pub partitions_default: Option<u32>,
    pub backpressure_max_stream_len: Option<u64>,
    pub key_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAuthConfig {
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_ttl_seconds: Option<u64>,
    pub admin_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawLoggingConfig {
    pub format: Option<LogFormat>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Default)]
pub struct OpenStreamConfig {
    pub server: ServerSection,
    pub engine: EngineConfig,
    pub stream: StreamConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl OpenStreamConfig {
    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.auth.jwt_secret = REDACTED.to_string();
        config.auth.admin_secret = REDACTED.to_string();
        config
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerSection {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Origins allowed to call the API from a browser
    pub cors_allow_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_allow_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown log format {0:?} (expected \"text\" or \"json\")")]
pub struct UnknownLogFormat(String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(UnknownLogFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origins(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
