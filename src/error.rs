//! Error types

/// Result type for session store operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can happen while reading or writing sessions
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session record couldn't be serialized for storage
    #[error("Failed to serialize session: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A generic error from the key-value client. This error type can be
    /// used when implementing a custom [`KeyValueClient`](crate::client::KeyValueClient).
    #[error("Storage backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),

    #[cfg(feature = "redis_fred")]
    #[error("fred.rs client error: {0}")]
    RedisFredError(#[from] fred::error::Error),
}
