//! Configuration for token issuance and validation

use serde::{Deserialize, Serialize};

/// Configuration for HS256 bearer tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Expected `iss` claim
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,

    /// Expected `aud` claim
    #[serde(default = "default_audience")]
    pub jwt_audience: String,

    /// Shared HMAC secret
    #[serde(default = "default_secret")]
    pub jwt_secret: String,

    /// Lifetime of issued tokens in seconds
    #[serde(default = "default_ttl")]
    pub jwt_ttl_seconds: u64,

    /// Secret guarding the token minting endpoint
    #[serde(default = "default_admin_secret")]
    pub admin_secret: String,
}

fn default_issuer() -> String {
    "openstream".to_string()
}

fn default_audience() -> String {
    "openstream".to_string()
}

fn default_secret() -> String {
    "dev-only-change-me".to_string()
}

fn default_ttl() -> u64 {
    3600
}

fn default_admin_secret() -> String {
    "dev-admin-secret".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_issuer: default_issuer(),
            jwt_audience: default_audience(),
            jwt_secret: default_secret(),
            jwt_ttl_seconds: default_ttl(),
            admin_secret: default_admin_secret(),
        }
    }
}

impl AuthConfig {
    /// Create a config with a custom signing secret
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = secret.into();
        self
    }

    /// Returns true if the built-in development secrets are still in use
    pub fn uses_dev_secrets(&self) -> bool {
        self.jwt_secret == default_secret() || self.admin_secret == default_admin_secret()
    }
}
