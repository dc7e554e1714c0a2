//! Error types for log engine operations.

/// Error type for log engine operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The Redis driver reported a failure (connection, timeout, server error).
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The consumer group does not exist on the given log.
    #[error("no such consumer group '{group}' on log '{log}'")]
    NoGroup { log: String, group: String },

    /// The consumer group already exists on the given log.
    #[error("consumer group '{group}' already exists on log '{log}'")]
    GroupExists { log: String, group: String },

    /// The log does not exist yet.
    #[error("no such log: {0}")]
    NoSuchLog(String),

    /// An entry id could not be parsed.
    #[error("invalid entry id: {0}")]
    InvalidId(String),

    /// The engine answered with a reply shape we do not understand.
    #[error("unexpected engine reply: {0}")]
    UnexpectedReply(String),

    /// The engine is unreachable or refused the call.
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    /// Returns true if the error reports a group that already exists.
    pub fn is_group_exists(&self) -> bool {
        match self {
            Error::GroupExists { .. } => true,
            Error::Redis(e) => e.code() == Some("BUSYGROUP"),
            _ => false,
        }
    }

    /// Returns true if the error reports a missing group or log.
    pub fn is_missing_group(&self) -> bool {
        match self {
            Error::NoGroup { .. } | Error::NoSuchLog(_) => true,
            Error::Redis(e) => e.code() == Some("NOGROUP"),
            _ => false,
        }
    }
}

/// Result type alias for log engine operations.
pub type Result<T> = std::result::Result<T, Error>;
