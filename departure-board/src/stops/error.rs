//! Stop discovery error types.

/// Errors that can occur while resolving board stops.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Subscription key rejected
    #[error("unauthorized: check AT_API_KEY")]
    Unauthorized,

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// The search matched no stops
    #[error("no stops found for {0:?}")]
    NotFound(String),
}
