//! Error types for session backends

/// Result type for session backend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for session backend operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Session key absent or expired
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Backend connection error
    #[error("Backend connection error: {0}")]
    Connection(String),

    /// Session payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Operation timeout
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Backend-specific error
    #[error("Backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Whether the error reports an absent or expired session
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<Error> for courier_core::Error {
    fn from(err: Error) -> Self {
        courier_core::Error::session_backend(err)
    }
}
