//! Error types for openstream-core

use thiserror::Error;

use crate::auth::AuthError;

pub use openstream_log::Error as LogError;

/// Errors surfaced by coordination operations.
///
/// Validation and backpressure are detected locally, before or instead of
/// touching the engine. Nothing here is retried automatically.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Malformed request shape or out-of-bounds value.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing or invalid credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Valid credentials without the required role.
    #[error("forbidden")]
    Forbidden,

    /// Partition is at or over the configured maximum length.
    #[error(
        "partition {partition} of topic '{topic}' is at or over max length ({length}); consumers are too slow or retention too high"
    )]
    Backpressure {
        topic: String,
        partition: u32,
        length: u64,
    },

    #[error("not found: {0}")]
    NotFound(String),

    /// The log engine call failed.
    #[error("engine error: {0}")]
    Engine(#[from] LogError),
}

impl StreamError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        StreamError::Validation(message.into())
    }

    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            StreamError::Validation(_) => "validation_error",
            StreamError::Unauthorized(_) => "unauthorized",
            StreamError::Forbidden => "forbidden",
            StreamError::Backpressure { .. } => "backpressure",
            StreamError::NotFound(_) => "not_found",
            StreamError::Engine(_) => "engine_error",
        }
    }
}

impl From<AuthError> for StreamError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden { .. } | AuthError::BadAdminSecret => StreamError::Forbidden,
            other => StreamError::Unauthorized(other.to_string()),
        }
    }
}

/// Result alias for coordination operations.
pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Operation, Role};

    #[test]
    fn backpressure_message_names_partition() {
        let err = StreamError::Backpressure {
            topic: "orders".to_string(),
            partition: 2,
            length: 1000,
        };
        let message = err.to_string();
        assert!(message.contains("partition 2"));
        assert!(message.contains("orders"));
        assert_eq!(err.code(), "backpressure");
    }

    #[test]
    fn auth_errors_split_into_401_and_403_kinds() {
        let missing: StreamError = AuthError::MissingToken.into();
        assert!(matches!(missing, StreamError::Unauthorized(_)));

        let denied: StreamError = AuthError::Forbidden {
            role: Role::Producer,
            operation: Operation::Read,
        }
        .into();
        assert!(matches!(denied, StreamError::Forbidden));
    }

    #[test]
    fn engine_errors_convert() {
        let err: StreamError = LogError::Unavailable("down".to_string()).into();
        assert_eq!(err.code(), "engine_error");
    }
}
