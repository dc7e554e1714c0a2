use super::types::{
    LogFormat, LoggingConfig, OpenStreamConfig, RawAuthConfig, RawEngineConfig,
    RawLoggingConfig, RawOpenStreamConfig, RawServerConfig, RawStreamConfig, ServerSection,
    parse_origins,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use openstream_core::{AuthConfig, StreamConfig};
use openstream_log::EngineConfig;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_REDIS_URL: &str = "OPENSTREAM_REDIS_URL";
pub const ENV_KEY_PREFIX: &str = "OPENSTREAM_KEY_PREFIX";
pub const ENV_PARTITIONS_DEFAULT: &str = "OPENSTREAM_PARTITIONS_DEFAULT";
pub const ENV_MAX_STREAM_LEN: &str = "OPENSTREAM_MAX_STREAM_LEN";
pub const ENV_JWT_SECRET: &str = "OPENSTREAM_JWT_SECRET";
pub const ENV_ADMIN_SECRET: &str = "OPENSTREAM_ADMIN_SECRET";
pub const ENV_HOST: &str = "OPENSTREAM_HOST";
pub const ENV_PORT: &str = "OPENSTREAM_PORT";
pub const ENV_CORS_ORIGINS: &str = "OPENSTREAM_CORS_ORIGINS";
pub const ENV_LOG_FORMAT: &str = "OPENSTREAM_LOG_FORMAT";

/// Every environment variable the loader honours
pub const ENV_OVERRIDES: &[&str] = &[
    ENV_REDIS_URL,
    ENV_KEY_PREFIX,
    ENV_PARTITIONS_DEFAULT,
    ENV_MAX_STREAM_LEN,
    ENV_JWT_SECRET,
    ENV_ADMIN_SECRET,
    ENV_HOST,
    ENV_PORT,
    ENV_CORS_ORIGINS,
    ENV_LOG_FORMAT,
];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (defaults, user file, `--config` file, environment)
    pub fn load(explicit: Option<&Path>) -> Result<OpenStreamConfig> {
        let user = Self::user_config_path();
        Self::load_layers(user.as_deref(), explicit, |name| std::env::var(name).ok())
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "openstream").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Merge every layer. A missing user file is skipped; a missing explicit file is an error.
    pub fn load_layers<F>(
        user: Option<&Path>,
        explicit: Option<&Path>,
        env: F,
    ) -> Result<OpenStreamConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut raw = RawOpenStreamConfig::default();

        // Layer 1: User config
        if let Some(path) = user
            && path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(path)?);
        }

        // Layer 2: Explicit config
        if let Some(path) = explicit {
            raw = Self::merge_raw(raw, Self::read_raw(path)?);
        }

        // Layer 3: Environment
        let raw = Self::apply_env(raw, env)?;

        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<RawOpenStreamConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawOpenStreamConfig, overlay: RawOpenStreamConfig) -> RawOpenStreamConfig {
        RawOpenStreamConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
                cors_allow_origins: overlay
                    .server
                    .cors_allow_origins
                    .or(base.server.cors_allow_origins),
            },
            engine: RawEngineConfig {
                redis_url: overlay.engine.redis_url.or(base.engine.redis_url),
                blocking_pool_size: overlay
                    .engine
                    .blocking_pool_size
                    .or(base.engine.blocking_pool_size),
            },
            stream: RawStreamConfig {
                partitions_default: overlay
                    .stream
                    .partitions_default
                    .or(base.stream.partitions_default),
                backpressure_max_stream_len: overlay
                    .stream
                    .backpressure_max_stream_len
                    .or(base.stream.backpressure_max_stream_len),
                key_prefix: overlay.stream.key_prefix.or(base.stream.key_prefix),
            },
            auth: RawAuthConfig {
                jwt_issuer: overlay.auth.jwt_issuer.or(base.auth.jwt_issuer),
                jwt_audience: overlay.auth.jwt_audience.or(base.auth.jwt_audience),
                jwt_secret: overlay.auth.jwt_secret.or(base.auth.jwt_secret),
                jwt_ttl_seconds: overlay.auth.jwt_ttl_seconds.or(base.auth.jwt_ttl_seconds),
                admin_secret: overlay.auth.admin_secret.or(base.auth.admin_secret),
            },
            logging: RawLoggingConfig {
                format: overlay.logging.format.or(base.logging.format),
            },
        }
    }

    fn apply_env<F>(mut raw: RawOpenStreamConfig, env: F) -> Result<RawOpenStreamConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = env(ENV_REDIS_URL) {
            raw.engine.redis_url = Some(url);
        }
        if let Some(prefix) = env(ENV_KEY_PREFIX) {
            raw.stream.key_prefix = Some(prefix);
        }
        if let Some(value) = env(ENV_PARTITIONS_DEFAULT) {
            raw.stream.partitions_default = Some(parse_env(ENV_PARTITIONS_DEFAULT, &value)?);
        }
        if let Some(value) = env(ENV_MAX_STREAM_LEN) {
            raw.stream.backpressure_max_stream_len = Some(parse_env(ENV_MAX_STREAM_LEN, &value)?);
        }
        if let Some(secret) = env(ENV_JWT_SECRET) {
            raw.auth.jwt_secret = Some(secret);
        }
        if let Some(secret) = env(ENV_ADMIN_SECRET) {
            raw.auth.admin_secret = Some(secret);
        }
        if let Some(host) = env(ENV_HOST) {
            raw.server.host = Some(host);
        }
        if let Some(value) = env(ENV_PORT) {
            raw.server.port = Some(parse_env(ENV_PORT, &value)?);
        }
        if let Some(list) = env(ENV_CORS_ORIGINS) {
            raw.server.cors_allow_origins = Some(parse_origins(&list));
        }
        if let Some(value) = env(ENV_LOG_FORMAT) {
            raw.logging.format = Some(parse_env::<LogFormat>(ENV_LOG_FORMAT, &value)?);
        }
        Ok(raw)
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawOpenStreamConfig) -> OpenStreamConfig {
        let server_defaults = ServerSection::default();
        let engine_defaults = EngineConfig::default();
        let stream_defaults = StreamConfig::default();
        let auth_defaults = AuthConfig::default();

        OpenStreamConfig {
            server: ServerSection {
                host: raw.server.host.unwrap_or(server_defaults.host),
                port: raw.server.port.unwrap_or(server_defaults.port),
                cors_allow_origins: raw
                    .server
                    .cors_allow_origins
                    .unwrap_or(server_defaults.cors_allow_origins),
            },
            engine: EngineConfig::default()
                .with_redis_url(raw.engine.redis_url.unwrap_or(engine_defaults.redis_url))
                .with_blocking_pool_size(
                    raw.engine
                        .blocking_pool_size
                        .unwrap_or(engine_defaults.blocking_pool_size),
                ),
            stream: StreamConfig::default()
                .with_partitions_default(
                    raw.stream
                        .partitions_default
                        .unwrap_or(stream_defaults.partitions_default),
                )
                .with_max_stream_len(
                    raw.stream
                        .backpressure_max_stream_len
                        .unwrap_or(stream_defaults.backpressure_max_stream_len),
                )
                .with_key_prefix(raw.stream.key_prefix.unwrap_or(stream_defaults.key_prefix)),
            auth: AuthConfig {
                jwt_issuer: raw.auth.jwt_issuer.unwrap_or(auth_defaults.jwt_issuer),
                jwt_audience: raw.auth.jwt_audience.unwrap_or(auth_defaults.jwt_audience),
                jwt_secret: raw.auth.jwt_secret.unwrap_or(auth_defaults.jwt_secret),
                jwt_ttl_seconds: raw
                    .auth
                    .jwt_ttl_seconds
                    .unwrap_or(auth_defaults.jwt_ttl_seconds),
                admin_secret: raw.auth.admin_secret.unwrap_or(auth_defaults.admin_secret),
            },
            logging: LoggingConfig {
                format: raw.logging.format.unwrap_or_default(),
            },
        }
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{name} has an invalid value {value:?}"))
}
