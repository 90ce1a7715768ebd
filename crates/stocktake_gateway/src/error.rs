//! Error types for the external inventory gateway.

use thiserror::Error;

/// Gateway operation result type.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors from the external inventory platform.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("Gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform asked us to slow down; retryable with backoff
    #[error("Gateway throttled the request")]
    Throttled,

    /// Catalog entry or location the platform doesn't know
    #[error("Not found: {0}")]
    NotFound(String),

    /// The platform accepted the request but reported a business error
    #[error("Gateway error: {0}")]
    Api(String),

    /// Response body didn't match the expected shape
    #[error("Malformed gateway response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// Whether the caller should retry with backoff.
    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled)
    }
}
