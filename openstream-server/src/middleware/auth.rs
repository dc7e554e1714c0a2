//! Bearer token authentication middleware for axum

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use openstream_core::AuthError;

use crate::{AppState, error::ApiError};

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Authentication middleware function
///
/// Validates the bearer token and attaches the caller's
/// [`Principal`](openstream_core::Principal) to the request extensions.
/// Role checks happen in the handlers.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = {
        let token = extract_bearer(request.headers()).ok_or(AuthError::MissingToken)?;
        state.tokens.validate(token).inspect_err(|e| {
            tracing::debug!("Bearer token rejected: {}", e);
        })?
    };

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
