//! Authentication error types

use thiserror::Error;

use super::{Operation, Role};

/// Errors that can occur during authentication and authorization
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token was provided in the request
    #[error("missing bearer token")]
    MissingToken,

    /// The token decoded but lacks a usable `sub` or `role`
    #[error("invalid token claims")]
    InvalidClaims,

    /// The caller's role does not allow the operation
    #[error("role '{role}' may not perform {operation:?}")]
    Forbidden { role: Role, operation: Operation },

    /// The admin secret presented for token minting did not match
    #[error("admin secret mismatch")]
    BadAdminSecret,

    /// Signature, expiry, issuer, audience or format check failed
    #[error("invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}
