//! HS256 token issuance and validation

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::{AuthConfig, AuthError, Principal, Role};

/// Claims written into issued tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub sub: String,
    pub role: Role,
}

/// Claims as read back; `sub` and `role` are checked after signature validation
#[derive(Debug, Deserialize)]
struct IncomingClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// Issues and validates bearer tokens with a shared secret
pub struct TokenService {
    config: AuthConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a new TokenService with the given configuration
    pub fn new(config: AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.jwt_issuer]);
        validation.set_audience(&[&config.jwt_audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            config,
        }
    }

    /// Issue a token for `sub` with `role`, valid for the configured TTL
    pub fn issue(&self, sub: &str, role: Role) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let claims = TokenClaims {
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
            iat: now,
            exp: now + self.config.jwt_ttl_seconds as i64,
            sub: sub.to_string(),
            role,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Validate a token and return the caller it identifies
    pub fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        let data = decode::<IncomingClaims>(token, &self.decoding, &self.validation)?;
        let sub = data.claims.sub.ok_or(AuthError::InvalidClaims)?;
        let role = data
            .claims
            .role
            .ok_or(AuthError::InvalidClaims)?
            .parse::<Role>()?;
        Ok(Principal { sub, role })
    }

    /// Mint a token if `admin_secret` matches the configured one
    pub fn mint(&self, admin_secret: &str, sub: &str, role: Role) -> Result<String, AuthError> {
        if admin_secret != self.config.admin_secret {
            return Err(AuthError::BadAdminSecret);
        }
        self.issue(sub, role)
    }

    /// Get the configuration
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(AuthConfig::default())
    }

    fn sign(claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(exp_offset: i64) -> serde_json::Value {
        let now = chrono::Utc::now().timestamp();
        serde_json::json!({
            "iss": "openstream",
            "aud": "openstream",
            "iat": now,
            "exp": now + exp_offset,
            "sub": "svc",
            "role": "producer",
        })
    }

    #[test]
    fn issued_token_validates() {
        let tokens = service();
        let token = tokens.issue("worker-1", Role::Consumer).unwrap();
        let principal = tokens.validate(&token).unwrap();
        assert_eq!(principal, Principal::new("worker-1", Role::Consumer));
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = sign(&claims(60), "other-secret");
        assert!(matches!(service().validate(&token), Err(AuthError::Jwt(_))));
    }

    #[test]
    fn expired_token_rejected() {
        let token = sign(&claims(-10), "dev-only-change-me");
        assert!(matches!(service().validate(&token), Err(AuthError::Jwt(_))));
    }

    #[test]
    fn wrong_audience_rejected() {
        let mut c = claims(60);
        c["aud"] = "someone-else".into();
        let token = sign(&c, "dev-only-change-me");
        assert!(service().validate(&token).is_err());
    }

    #[test]
    fn unknown_role_is_invalid_claims() {
        let mut c = claims(60);
        c["role"] = "root".into();
        let token = sign(&c, "dev-only-change-me");
        assert!(matches!(service().validate(&token), Err(AuthError::InvalidClaims)));
    }

    #[test]
    fn missing_sub_is_invalid_claims() {
        let mut c = claims(60);
        c.as_object_mut().unwrap().remove("sub");
        let token = sign(&c, "dev-only-change-me");
        assert!(matches!(service().validate(&token), Err(AuthError::InvalidClaims)));
    }

    #[test]
    fn garbage_rejected() {
        assert!(service().validate("not.a.jwt").is_err());
    }

    #[test]
    fn mint_checks_admin_secret() {
        let tokens = service();
        assert!(matches!(
            tokens.mint("wrong", "svc", Role::Admin),
            Err(AuthError::BadAdminSecret)
        ));
        let token = tokens.mint("dev-admin-secret", "svc", Role::Admin).unwrap();
        assert_eq!(tokens.validate(&token).unwrap().role, Role::Admin);
    }
}
