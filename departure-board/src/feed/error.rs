//! Upstream feed error types.

/// Coarse classification of an [`UpstreamError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamErrorKind {
    AuthMissing,
    NetworkError,
    MalformedResponse,
    EmptyQuota,
}

/// Errors from fetching live departures.
///
/// All of these are recoverable: the refresh engine falls back to
/// simulated or stale data instead of propagating them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    /// No API key configured, or the key was rejected
    #[error("unauthorized: no valid AT_API_KEY")]
    AuthMissing,

    /// Connection failure, timeout or unexpected HTTP status
    #[error("network error: {message}")]
    Network { message: String },

    /// Response body could not be decoded as a feed
    #[error("malformed feed response: {message}")]
    MalformedResponse { message: String },

    /// The API call quota is used up
    #[error("API call quota exhausted")]
    EmptyQuota,
}

impl UpstreamError {
    pub fn kind(&self) -> UpstreamErrorKind {
        match self {
            UpstreamError::AuthMissing => UpstreamErrorKind::AuthMissing,
            UpstreamError::Network { .. } => UpstreamErrorKind::NetworkError,
            UpstreamError::MalformedResponse { .. } => UpstreamErrorKind::MalformedResponse,
            UpstreamError::EmptyQuota => UpstreamErrorKind::EmptyQuota,
        }
    }

    pub(crate) fn network(message: impl Into<String>) -> Self {
        UpstreamError::Network {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::network(format!("request timed out: {err}"))
        } else {
            UpstreamError::network(err.to_string())
        }
    }
}

impl From<prost::DecodeError> for UpstreamError {
    fn from(err: prost::DecodeError) -> Self {
        UpstreamError::MalformedResponse {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = UpstreamError::AuthMissing;
        assert_eq!(err.to_string(), "unauthorized: no valid AT_API_KEY");

        let err = UpstreamError::network("connection refused");
        assert_eq!(err.to_string(), "network error: connection refused");

        let err = UpstreamError::MalformedResponse {
            message: "invalid wire type".into(),
        };
        assert!(err.to_string().contains("malformed feed response"));

        let err = UpstreamError::EmptyQuota;
        assert_eq!(err.to_string(), "API call quota exhausted");
    }

    #[test]
    fn kinds() {
        assert_eq!(
            UpstreamError::AuthMissing.kind(),
            UpstreamErrorKind::AuthMissing
        );
        assert_eq!(
            UpstreamError::network("x").kind(),
            UpstreamErrorKind::NetworkError
        );
        assert_eq!(
            UpstreamError::EmptyQuota.kind(),
            UpstreamErrorKind::EmptyQuota
        );
    }
}
