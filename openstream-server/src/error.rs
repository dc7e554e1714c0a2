//! Server error types and the JSON error envelope

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use openstream_core::{AuthError, StreamError};
use serde_json::json;

/// Errors that can occur starting or running the server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The metrics recorder could not be installed
    #[error("failed to install metrics recorder: {0}")]
    Metrics(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

/// A [`StreamError`] on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub StreamError);

impl From<StreamError> for ApiError {
    fn from(err: StreamError) -> Self {
        ApiError(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            StreamError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StreamError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            StreamError::Forbidden => StatusCode::FORBIDDEN,
            StreamError::Backpressure { .. } => StatusCode::TOO_MANY_REQUESTS,
            StreamError::NotFound(_) => StatusCode::NOT_FOUND,
            StreamError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code();

        let body = match &self.0 {
            StreamError::Backpressure {
                topic,
                partition,
                length,
            } => json!({
                "error": code,
                "message": "Stream is at/over max length; consumers are too slow or retention too high.",
                "topic": topic,
                "partition": partition,
                "stream_len": length,
            }),
            StreamError::Engine(e) => {
                tracing::error!(error = %e, "Log engine request failed");
                json!({ "error": code, "message": "log engine request failed" })
            }
            other => json!({ "error": code, "message": other.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::TOO_MANY_REQUESTS {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}
