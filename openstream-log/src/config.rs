//! Configuration for the log engine client.

use serde::{Deserialize, Serialize};

/// Configuration for the Redis-backed log engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Redis connection URL (`redis://[user:pass@]host[:port][/db]`).
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Maximum number of dedicated connections parked in blocking reads.
    #[serde(default = "default_blocking_pool_size")]
    pub blocking_pool_size: usize,
}

fn default_redis_url() -> String {
    "redis://localhost:6379/0".to_string()
}

fn default_blocking_pool_size() -> usize {
    16
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            blocking_pool_size: default_blocking_pool_size(),
        }
    }
}

impl EngineConfig {
    /// Create a new config with a custom Redis URL.
    #[must_use]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Create a new config with a custom blocking pool size.
    #[must_use]
    pub fn with_blocking_pool_size(mut self, size: usize) -> Self {
        self.blocking_pool_size = size.max(1);
        self
    }
}
