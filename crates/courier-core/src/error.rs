//! Error types for Courier

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error source carried by backend failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for Courier
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Session operation attempted with no session key bound
    #[error("No session is bound to this response")]
    NoSessionBound,

    /// Failure reported by the session backend
    #[error("Session backend error: {0}")]
    SessionBackend(#[source] BoxError),

    /// Status, headers or cookies changed after the response head was sent
    #[error("Response head already committed, cannot {0}")]
    HeadersCommitted(&'static str),

    /// Header value could not be encoded
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    /// Invalid HTTP request
    #[error("Invalid HTTP request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Runtime error
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from the transport or the compressor
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),
}

impl Error {
    /// Wrap a session backend failure
    pub fn session_backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::SessionBackend(Box::new(err))
    }

    /// Convert error to HTTP status code
    pub fn to_status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::InvalidRequest(_) | Error::Http(_) => StatusCode::BAD_REQUEST,
            Error::SessionBackend(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
